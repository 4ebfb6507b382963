//! Document template rendering engine.
//!
//! A render runs: context builder, token scanner, placeholder resolver (with the
//! table generator and aggregate calculator), markup formatter, Typst renderer and
//! finally the PDF backend. Everything up to the renderer is pure and works on a
//! [`DocumentContext`] owned by that single render.

pub mod aggregate;
pub mod catalog;
pub mod common;
pub mod context;
pub mod engine;
pub mod format;
pub mod handlers;
pub mod markup;
pub mod models;
pub mod render;
pub mod resolver;
pub mod scanner;
pub mod service;
pub mod table;
pub mod validation;

pub use context::{ContextBuilder, ContextRequest, DocumentContext, DocumentType};
pub use engine::{PdfBackend, TypstRenderEngine};
pub use format::FormatConfig;
pub use markup::{format_blocks, Alignment, BlockKind, RenderedBlock};
pub use render::{LetterheadOption, PageLayout};
pub use resolver::Resolver;
pub use service::{
    render_template, DocumentService, DocumentSettings, GenerateDocumentRequest,
    GeneratedDocument, PreviewRequest, PreviewResponse,
};
pub use validation::Validator;

use thiserror::Error;

/// Errors that end a render. Resolution gaps never show up here.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{0}")]
    Validation(String),
    #[error("template {0} not found")]
    TemplateNotFound(i64),
    #[error("failed to load document data: {0}")]
    DataAccess(String),
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write Typst source: {0}")]
    WriteTypst(#[source] std::io::Error),
    #[error("Typst CLI execution failed: {0}")]
    TypstIo(#[source] std::io::Error),
    #[error("Typst CLI exited with status {0}")]
    TypstExit(i32),
    #[error("failed to read generated PDF: {0}")]
    ReadPdf(#[source] std::io::Error),
    #[error("failed to share document: {0}")]
    Storage(String),
    #[error("render task failed: {0}")]
    Join(String),
}

impl From<sqlx::Error> for DocumentError {
    fn from(err: sqlx::Error) -> Self {
        Self::DataAccess(err.to_string())
    }
}
