//! Error types for the PDF library

use thiserror::Error;

/// PDF building error types
#[derive(Debug, Error)]
pub enum PdfError {
    /// Object model or serialization error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error while writing the document
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Page index outside the document
    #[error("Page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    /// Image handle not registered with this builder
    #[error("Unknown image: {0}")]
    UnknownImage(usize),

    /// Image could not be decoded or has inconsistent dimensions
    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

/// Result type for PDF operations
pub type PdfResult<T> = Result<T, PdfError>;
