//! Error types for the md2pdf library.
//!
//! Two distinct error types reflect two distinct layers:
//!
//! * [`Md2PdfError`] — **Fatal** for the current job or call: the content
//!   could not be fetched, failed validation, or the print service refused
//!   it. Every public operation returns `Err(Md2PdfError)`, and the job
//!   runner persists its message into the status record before propagating.
//!
//! * [`StorageError`] — raised by an [`crate::store::ObjectStore`]
//!   implementation. It is converted into [`Md2PdfError::Storage`] (or
//!   [`Md2PdfError::ContentNotFound`] for a missing source object) at the
//!   pipeline boundary so callers only match on one enum.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The Markdown source object does not exist (or vanished before it was read).
    #[error("Markdown content not found at '{key}'")]
    ContentNotFound { key: String },

    /// The source bytes are not valid UTF-8 text.
    #[error("Markdown content at '{key}' is not valid UTF-8")]
    ContentNotUtf8 { key: String },

    /// Empty or whitespace-only Markdown.
    #[error("No markdown content provided")]
    EmptyContent,

    /// Markdown exceeds the configured size limit.
    #[error("Content too large: {size} bytes. Maximum size is {limit_mib}MB")]
    ContentTooLarge { size: usize, limit: usize, limit_mib: usize },

    /// Upload filename is not a Markdown file.
    #[error("Invalid upload filename '{filename}': only .md files are accepted")]
    InvalidFilename { filename: String },

    /// A trigger key that does not follow the addressing scheme.
    #[error("Invalid source key '{key}': {reason}")]
    InvalidSourceKey { key: String, reason: String },

    /// A trigger payload that could not be decoded.
    #[error("Invalid trigger event: {0}")]
    InvalidEvent(String),

    /// Could not read a local Markdown file.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// The print service failed to launch, print, or returned a non-PDF body.
    #[error("Rendering engine error: {0}")]
    RenderEngine(String),

    /// Object store failure other than a missing source object.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A job state transition that the state machine forbids.
    #[error("Illegal job state transition from '{from}' to '{to}'")]
    IllegalTransition { from: String, to: String },

    /// The poller gave up before a terminal status appeared.
    #[error("Timed out after {secs}s waiting for status at '{key}'")]
    StatusTimeout { key: String, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Md2PdfError {
    /// Map a storage failure on a source fetch: a missing object becomes
    /// [`Md2PdfError::ContentNotFound`], everything else stays a storage error.
    pub fn from_source_fetch(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key } => Md2PdfError::ContentNotFound { key },
            other => Md2PdfError::Storage(other),
        }
    }
}

/// Errors raised by object store backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("read error for '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write error for '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("delete error for '{key}': {source}")]
    Delete {
        key: String,
        #[source]
        source: std::io::Error,
    },
}
