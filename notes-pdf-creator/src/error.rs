//! Error types for notes PDF creation.
//!
//! Most problems in this crate degrade output instead of failing: text that
//! cannot be shaped passes through, unparseable model output becomes an empty
//! question list and a missing Urdu font falls back to Helvetica. Only the
//! cases below abort a chapter.

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NotesError>;

#[derive(Error, Debug)]
pub enum NotesError {
    /// Reading a font file or writing the final PDF failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The PDF object model rejected an operation.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// A font file was found but could not be parsed.
    #[error("Font error: {0}")]
    Font(String),

    /// Page composition hit an unexpected state.
    #[error("Render error: {0}")]
    Render(String),

    /// Layout options could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
