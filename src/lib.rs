//! # md2pdf
//!
//! Convert Markdown documents into branded, paginated PDFs.
//!
//! ## Why this crate?
//!
//! Reports, proposals and statements of advice are written in Markdown but
//! delivered as PDFs with a consistent look: same style sheet, same footer,
//! a filename that says what the document is and who it is for. This crate
//! turns free-form Markdown into that PDF, reading the title, version,
//! client and date out of the text itself, and drives the conversion as an
//! upload-triggered job with a pollable status record.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Fetch     object store (upload) or local file; size/emptiness checks
//!  ├─ 2. Extract   title, version, client, date via ordered matchers
//!  ├─ 3. Render    CommonMark + GFM → HTML, syntect-highlighted code blocks
//!  ├─ 4. Assemble  full HTML document, footer template, PDF filename
//!  ├─ 5. Print     headless-browser print service (one session, always closed)
//!  └─ 6. Persist   PDF + `complete` / `error` status record
//! ```
//!
//! Stages 2–4 are pure ([`pipeline`]); only the job runner ([`job`]) and the
//! local converter ([`convert`]) perform I/O.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2pdf::{convert_file, ConversionConfig, HttpRenderEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .document_name("Acme Proposal")
//!         .build()?;
//!     let engine = HttpRenderEngine::new("http://localhost:3000");
//!     let output = convert_file("proposal.md", "out/", &engine, &config).await?;
//!     println!("wrote {}", output.location);
//!     Ok(())
//! }
//! ```
//!
//! ## Upload Jobs
//!
//! ```text
//! submit_markdown ──▶ uploads/<rel>.md ──(notification)──▶ process_upload
//!        │                                                     │
//!        └──── wait_for_status ◀── status/<rel>.json ◀─────────┤
//!                                  generated/<rel>/<name>.pdf ◀┘
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! md2pdf = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod branding;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod job;
pub mod keys;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod status;
pub mod store;
pub mod styles;
pub mod submit;
pub mod trigger;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use branding::{Branding, Logo};
pub use config::{ConversionConfig, ConversionConfigBuilder, KeyLayout};
pub use convert::{convert_file, inspect, render_document, render_document_with};
pub use engine::{print_with_session, HttpRenderEngine, Margins, PrintOptions, RenderEngine, RenderSession};
pub use error::{Md2PdfError, StorageError};
pub use job::{handle_notification, process_events, process_upload, JobContext, JobOutcome, JobReport};
pub use keys::JobKeys;
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, RenderedDocument};
pub use pipeline::markdown::MarkdownRenderer;
pub use progress::{JobProgressCallback, JobStage, NoopProgressCallback, ProgressCallback};
pub use status::{JobState, StatusRecord};
pub use store::{load_json, save_json, FsObjectStore, MemoryObjectStore, ObjectStore};
pub use submit::{submit_markdown, wait_for_status};
pub use trigger::{parse_notification, UploadEvent};
