//! Pure pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step and none of
//! them touch storage or the print engine, so every stage is testable on
//! plain strings.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ metadata ──▶ markdown ──▶ assemble
//! (limits)   (BOM/EOL)    (matchers)   (HTML +      (document,
//!                                      highlight)   footer, name)
//! ```
//!
//! 1. [`input`]     — reject empty or oversized content, settle the upload filename
//! 2. [`normalize`] — strip a leading BOM and unify line endings
//! 3. [`metadata`]  — ordered first-match-wins heuristics per field
//! 4. [`markdown`]  — CommonMark + GFM to HTML, fenced blocks via [`highlight`]
//! 5. [`assemble`]  — full HTML document, footer template and PDF filename

pub mod assemble;
pub mod highlight;
pub mod input;
pub mod markdown;
pub mod metadata;
pub mod normalize;
