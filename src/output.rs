//! Output types: the metadata record and per-conversion results.

use serde::{Deserialize, Serialize};

/// Fields heuristically extracted from a Markdown document.
///
/// Produced once per job by [`crate::pipeline::metadata::extract`] and
/// consumed by the assembler. Every field is always populated; unmatched
/// fields carry their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// First level-1 heading, or `"Document"`.
    pub title: String,
    /// Text of the first `**Version …**` marker, or `"1.0"`.
    pub version: String,
    /// Client / recipient name; empty when none was found.
    pub client_name: String,
    /// Document date as `YYYY-MM-DD`.
    pub date_str: String,
}

/// The deterministic part of a conversion: everything except the PDF bytes.
///
/// Returned by [`crate::convert::render_document`] and built internally by
/// every conversion path before the print service is involved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    pub metadata: DocumentMetadata,
    /// Complete HTML document handed to the print service.
    pub html: String,
    /// Footer template with `pageNumber` / `totalPages` placeholders.
    pub footer_template: String,
    /// Sanitised output filename, always ending in `.pdf`.
    pub filename: String,
}

/// Timing and size figures for one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionStats {
    /// Size of the Markdown source in bytes.
    pub source_bytes: usize,
    /// Size of the assembled HTML document in bytes.
    pub html_bytes: usize,
    /// Size of the produced PDF in bytes.
    pub pdf_bytes: usize,
    /// Time spent in extraction, rendering and assembly.
    pub render_duration_ms: u64,
    /// Time spent waiting on the print service.
    pub print_duration_ms: u64,
    /// Wall-clock time of the whole conversion.
    pub total_duration_ms: u64,
}

/// Result of a conversion that produced a PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutput {
    pub metadata: DocumentMetadata,
    pub filename: String,
    /// Object key (store conversions) or file path (local conversions).
    pub location: String,
    pub stats: ConversionStats,
}
