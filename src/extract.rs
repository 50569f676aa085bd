//! Format-aware text extraction for uploaded documents.
//!
//! Uploads are dispatched on their declared MIME type: PDFs go through
//! `pdf-extract`, DOCX packages are opened as ZIP archives and their
//! `word/document.xml` text runs collected. Legacy `.doc` binaries are
//! rejected outright instead of attempted. Extraction that yields only
//! whitespace is a failure of its own, distinct from an unsupported type.

use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;
use zip::ZipArchive;

/// MIME type of PDF uploads.
pub const PDF_MIME: &str = "application/pdf";
/// MIME type of Open XML word-processing uploads.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// MIME type of legacy binary Word documents, which are explicitly rejected.
pub const LEGACY_DOC_MIME: &str = "application/msword";

/// Errors produced while turning an uploaded document into plain text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Declared MIME type is neither PDF nor DOCX.
    #[error("Unsupported file type: {0}. Please upload a PDF or DOCX file.")]
    UnsupportedType(String),
    /// Legacy binary `.doc` upload; parsing is never attempted.
    #[error("File type .doc is not supported. Please upload a .docx or .pdf file.")]
    LegacyWordDocument,
    /// Parsing succeeded but produced no text worth summarizing.
    #[error("Could not extract text from the document.")]
    NoExtractableText,
    /// The document could not be parsed as its declared format.
    #[error("Failed to parse document: {0}")]
    Malformed(String),
    /// The uploaded file could not be read from ephemeral storage.
    #[error("Failed to read uploaded file: {0}")]
    Io(#[from] std::io::Error),
}

/// Extract plain text from the uploaded file at `path`.
///
/// Dispatches on the declared MIME type and enforces the non-empty
/// post-condition: whitespace-only output maps to
/// [`ExtractError::NoExtractableText`]. The file itself is left untouched;
/// deleting it is the caller's responsibility.
pub async fn extract(path: &Path, mime: &str) -> Result<String, ExtractError> {
    let text = match mime {
        PDF_MIME => {
            let bytes = tokio::fs::read(path).await?;
            run_blocking(move || pdf_text(&bytes)).await?
        }
        DOCX_MIME => {
            let bytes = tokio::fs::read(path).await?;
            run_blocking(move || docx_text(&bytes)).await?
        }
        LEGACY_DOC_MIME => return Err(ExtractError::LegacyWordDocument),
        other => return Err(ExtractError::UnsupportedType(other.to_string())),
    };

    if text.trim().is_empty() {
        tracing::warn!(mime, "Document parsed but contained no extractable text");
        return Err(ExtractError::NoExtractableText);
    }

    tracing::debug!(mime, chars = text.len(), "Text extraction complete");
    Ok(text)
}

/// Run a parser on the blocking thread pool, folding panics and join failures
/// into [`ExtractError::Malformed`].
async fn run_blocking<F>(parse: F) -> Result<String, ExtractError>
where
    F: FnOnce() -> Result<String, ExtractError> + Send + 'static,
{
    tokio::task::spawn_blocking(parse)
        .await
        .map_err(|err| ExtractError::Malformed(format!("extraction task failed: {err}")))?
}

fn pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|err| ExtractError::Malformed(format!("invalid PDF: {err}")))
}

fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| ExtractError::Malformed(format!("invalid DOCX package: {err}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|err| ExtractError::Malformed(format!("DOCX missing document.xml: {err}")))?
        .read_to_string(&mut xml)
        .map_err(|err| ExtractError::Malformed(format!("unreadable document.xml: {err}")))?;

    document_xml_text(&xml)
}

/// Collect the raw text of a WordprocessingML document body.
///
/// Text lives in `w:t` runs; paragraphs (`w:p`) become newlines, explicit
/// breaks (`w:br`) and tabs are preserved. All formatting is discarded.
fn document_xml_text(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"br" => out.push('\n'),
                b"tab" => out.push('\t'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let run = t.unescape().map_err(|err| {
                    ExtractError::Malformed(format!("invalid XML text run: {err}"))
                })?;
                out.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(ExtractError::Malformed(format!(
                    "invalid document XML: {err}"
                )));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{DOCX_MIME, ExtractError, LEGACY_DOC_MIME, document_xml_text, extract};
    use std::io::Write;
    use std::path::Path;
    use zip::write::SimpleFileOptions;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .expect("start file");
        writer
            .write_all(document_xml.as_bytes())
            .expect("write xml");
        writer.finish().expect("finish zip").into_inner()
    }

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(bytes).expect("write bytes");
        file
    }

    const TWO_PARAGRAPHS: &str = r#"<?xml version="1.0"?>
        <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
          <w:body>
            <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
            <w:p><w:r><w:t>Second paragraph.</w:t></w:r></w:p>
          </w:body>
        </w:document>"#;

    #[tokio::test]
    async fn unrecognized_type_is_rejected_without_parsing() {
        // the path does not exist, so any parse attempt would fail with Io
        let error = extract(Path::new("/nonexistent"), "text/plain")
            .await
            .expect_err("unsupported");
        assert!(matches!(error, ExtractError::UnsupportedType(mime) if mime == "text/plain"));
    }

    #[tokio::test]
    async fn legacy_doc_is_rejected_without_parsing() {
        let error = extract(Path::new("/nonexistent"), LEGACY_DOC_MIME)
            .await
            .expect_err("legacy");
        assert!(matches!(error, ExtractError::LegacyWordDocument));
    }

    #[tokio::test]
    async fn docx_paragraphs_become_plain_text() {
        let file = write_temp(&docx_bytes(TWO_PARAGRAPHS));
        let text = extract(file.path(), DOCX_MIME).await.expect("text");
        assert!(text.contains("First paragraph."));
        assert!(text.contains("Second paragraph."));
        let first = text.find("First").expect("first");
        let second = text.find("Second").expect("second");
        assert!(text[first..second].contains('\n'));
    }

    #[tokio::test]
    async fn whitespace_only_docx_reports_no_extractable_text() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
            <w:body><w:p><w:r><w:t> </w:t></w:r></w:p></w:body></w:document>"#;
        let file = write_temp(&docx_bytes(xml));
        let error = extract(file.path(), DOCX_MIME).await.expect_err("empty");
        assert!(matches!(error, ExtractError::NoExtractableText));
    }

    #[tokio::test]
    async fn docx_without_document_xml_is_malformed() {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("word/other.xml", SimpleFileOptions::default())
            .expect("start file");
        writer.write_all(b"<x/>").expect("write");
        let bytes = writer.finish().expect("finish").into_inner();

        let file = write_temp(&bytes);
        let error = extract(file.path(), DOCX_MIME).await.expect_err("malformed");
        assert!(matches!(error, ExtractError::Malformed(_)));
    }

    #[tokio::test]
    async fn garbage_pdf_surfaces_as_malformed() {
        let file = write_temp(b"definitely not a pdf");
        let error = extract(file.path(), super::PDF_MIME)
            .await
            .expect_err("malformed");
        assert!(matches!(error, ExtractError::Malformed(_)));
    }

    #[test]
    fn document_xml_unescapes_entities_and_breaks() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
            <w:body><w:p><w:r><w:t>a &amp; b</w:t><w:br/><w:t>c</w:t></w:r></w:p></w:body>
            </w:document>"#;
        let text = document_xml_text(xml).expect("text");
        assert!(text.contains("a & b"));
        assert!(text.contains("\nc"));
    }
}
