//! Markdown-to-PDF rendering through a headless browser engine.
//!
//! Rendering happens in three fixed steps: markdown becomes an HTML fragment,
//! the fragment is wrapped in a static print-styled document, and a dedicated
//! browser instance rasterizes the page to an A4 PDF. The engine sits behind
//! [`RenderEngine`] so the surrounding logic is testable without launching a
//! real browser; each invocation owns its own instance and tears it down by
//! scope, never sharing one across requests.

use async_trait::async_trait;
use pulldown_cmark::{Options, Parser, html};
use thiserror::Error;

/// Errors produced while rendering a markdown summary to PDF.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Submitted summary was missing or blank; checked before the engine starts.
    #[error("Summary content is missing or empty.")]
    EmptyMarkdown,
    /// Engine completed without error but produced a zero-length buffer.
    #[error("Failed to generate PDF file. The file is empty.")]
    EmptyArtifact,
    /// Engine failed to launch, load the page, or print.
    #[error("Failed to generate PDF file: {0}")]
    Engine(String),
}

/// Capability interface over the headless rendering engine.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Load the composed HTML document and print it to PDF bytes.
    async fn render_pdf(&self, page_html: String) -> Result<Vec<u8>, RenderError>;
}

/// Production engine backed by a headless Chromium process.
///
/// Every call launches a fresh browser, prints, and lets `Drop` reap both the
/// process and the staged page file, whatever path the render takes.
#[derive(Default)]
pub struct ChromiumEngine;

impl ChromiumEngine {
    /// Construct a new engine handle.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    async fn render_pdf(&self, page_html: String) -> Result<Vec<u8>, RenderError> {
        tokio::task::spawn_blocking(move || {
            print_with_browser(&page_html).map_err(|err| RenderError::Engine(err.to_string()))
        })
        .await
        .map_err(|err| RenderError::Engine(format!("render task failed: {err}")))?
    }
}

fn print_with_browser(page_html: &str) -> anyhow::Result<Vec<u8>> {
    use headless_chrome::types::PrintToPdfOptions;
    use headless_chrome::{Browser, LaunchOptions};
    use std::io::Write;

    let mut page_file = tempfile::Builder::new().suffix(".html").tempfile()?;
    page_file.write_all(page_html.as_bytes())?;
    page_file.flush()?;

    let launch_options = LaunchOptions::default_builder()
        .sandbox(false)
        .build()
        .map_err(|err| anyhow::anyhow!("failed to assemble launch options: {err}"))?;
    let browser = Browser::new(launch_options)?;
    let tab = browser.new_tab()?;

    tab.navigate_to(&format!("file://{}", page_file.path().display()))?;
    tab.wait_until_navigated()?;

    // A4 with 1cm margins on all sides, backgrounds included
    const CM: f64 = 0.3937;
    let pdf = tab.print_to_pdf(Some(PrintToPdfOptions {
        print_background: Some(true),
        paper_width: Some(8.27),
        paper_height: Some(11.69),
        margin_top: Some(CM),
        margin_bottom: Some(CM),
        margin_left: Some(CM),
        margin_right: Some(CM),
        ..Default::default()
    }))?;

    Ok(pdf)
}

/// Convert a markdown summary to an HTML fragment.
///
/// Heading levels, list nesting, paragraphs, and fenced code blocks all carry
/// over structurally.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

const PAGE_STYLE: &str = r#"
body {
    font-family: 'Times New Roman', serif;
    padding: 20px;
    line-height: 1.6;
}
h1, h2, h3, h4, h5, h6 {
    font-family: 'Times New Roman', serif;
    color: #333;
    border-bottom: 2px solid #ccc;
    padding-bottom: 10px;
}
p, ul, ol, li {
    font-family: 'Times New Roman', serif;
    color: #555;
}
h1 { font-size: 24px; }
h2 { font-size: 20px; }
h3 { font-size: 18px; }
p { margin-bottom: 1em; }
ul, ol { margin-left: 2em; }
li { margin-bottom: 0.5em; }
pre {
    background-color: #f4f4f4;
    padding: 10px;
    border-radius: 5px;
    white-space: pre-wrap;
    word-wrap: break-word;
}
"#;

/// Wrap the summary fragment in the fixed print-styled document.
///
/// The template is static; nothing about it depends on the input beyond the
/// injected body.
pub fn page_template(body_html: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>Dokumen Ringkas</title>\n<style>{PAGE_STYLE}</style>\n</head>\n<body>\n<h1>Ringkasan Dokumen</h1>\n<div>{body_html}</div>\n</body>\n</html>\n"
    )
}

/// Validates input, composes the page, and drives the engine.
pub struct Renderer {
    engine: Box<dyn RenderEngine>,
}

impl Renderer {
    /// Build a renderer around the given engine.
    pub fn new(engine: Box<dyn RenderEngine>) -> Self {
        Self { engine }
    }

    /// Render a markdown summary to a PDF artifact.
    ///
    /// Blank input fails before any engine work; a zero-length output buffer
    /// is reported as [`RenderError::EmptyArtifact`] rather than returned.
    pub async fn render(&self, markdown: &str) -> Result<Vec<u8>, RenderError> {
        if markdown.trim().is_empty() {
            return Err(RenderError::EmptyMarkdown);
        }

        let page = page_template(&markdown_to_html(markdown));
        let bytes = self.engine.render_pdf(page).await?;

        if bytes.is_empty() {
            tracing::error!("Rendering engine produced an empty PDF buffer");
            return Err(RenderError::EmptyArtifact);
        }

        tracing::info!(bytes = bytes.len(), "PDF rendered");
        Ok(bytes)
    }
}
