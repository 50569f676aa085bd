#![deny(missing_docs)]

//! Core library for the Ringkas document summarizer server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Format-aware document text extraction.
pub mod extract;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline usage counters.
pub mod metrics;
/// Pipeline orchestration service.
pub mod processing;
/// Markdown-to-PDF rendering.
pub mod render;
/// Generation-service client and bounded retry loop.
pub mod summarize;
/// Ephemeral storage for uploaded documents.
pub mod upload;
