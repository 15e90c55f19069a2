//! Progress-callback trait for per-stage job events.
//!
//! Inject an [`Arc<dyn JobProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as a job moves through its stages.
//!
//! # Why callbacks instead of channels?
//!
//! Callers can forward events to a tracing span, a metrics sink, or a
//! terminal spinner without the library knowing how the host application
//! communicates. The trait is `Send + Sync` because batch jobs run
//! concurrently.
//!
//! # Example
//!
//! ```rust
//! use md2pdf::{ConversionConfig, JobProgressCallback, JobStage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl JobProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, _job: &str, stage: JobStage, elapsed_ms: u64) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} done in {elapsed_ms}ms");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn JobProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The ordered stages of one conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    /// Read the Markdown source.
    Fetch,
    /// Extract metadata and render Markdown to HTML.
    Render,
    /// Build the full document, footer and filename.
    Assemble,
    /// Print through the rendering engine.
    Print,
    /// Store the PDF.
    Persist,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Fetch => "fetch",
            JobStage::Render => "render",
            JobStage::Assemble => "assemble",
            JobStage::Print => "print",
            JobStage::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// Called by the job runner as it moves through each stage.
///
/// `job` is the job's source key (or input path for local conversions).
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait JobProgressCallback: Send + Sync {
    /// Called once when the job starts, after the `processing` status is written.
    fn on_job_start(&self, job: &str) {
        let _ = job;
    }

    /// Called just before a stage begins.
    fn on_stage_start(&self, job: &str, stage: JobStage) {
        let _ = (job, stage);
    }

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&self, job: &str, stage: JobStage, elapsed_ms: u64) {
        let _ = (job, stage, elapsed_ms);
    }

    /// Called once after the PDF is stored.
    ///
    /// * `location` — output key or path
    /// * `pdf_bytes` — size of the produced PDF
    fn on_job_complete(&self, job: &str, location: &str, pdf_bytes: usize) {
        let _ = (job, location, pdf_bytes);
    }

    /// Called once when the job fails, with the message persisted in the
    /// status record.
    fn on_job_error(&self, job: &str, error: &str) {
        let _ = (job, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl JobProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn JobProgressCallback>;
