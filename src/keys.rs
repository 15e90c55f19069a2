//! Object-key conventions.
//!
//! Pure string functions, no storage dependency. One mirrored-path rule
//! covers every deployment mode:
//!
//! ```text
//! uploads/<rel>.md  ──▶  status/<rel>.json
//!                   ──▶  generated/<rel>/<pdf filename>
//! ```
//!
//! `<rel>` may carry an entity segment (`uploads/<entity>/report.md`); it is
//! mirrored verbatim, so a job's three keys always share the same relative
//! path and jobs for different uploads never collide.

use crate::config::KeyLayout;
use crate::error::Md2PdfError;
use serde::{Deserialize, Serialize};

const MARKDOWN_EXT: &str = ".md";
const STATUS_EXT: &str = ".json";

/// Keys of one conversion job, derived from its source key alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobKeys {
    /// Uploaded Markdown, e.g. `uploads/acme/report.md`.
    pub source_key: String,
    /// Status record, e.g. `status/acme/report.json`.
    pub status_key: String,
    /// Directory-like prefix for the PDF, e.g. `generated/acme/report/`.
    pub output_prefix: String,
}

impl JobKeys {
    /// Derive every key of a job from its upload key.
    pub fn from_source_key(source_key: &str, layout: &KeyLayout) -> Result<Self, Md2PdfError> {
        let invalid = |reason: &str| Md2PdfError::InvalidSourceKey {
            key: source_key.to_string(),
            reason: reason.to_string(),
        };

        let rel = source_key
            .strip_prefix(layout.uploads.as_str())
            .ok_or_else(|| invalid(&format!("must start with '{}'", layout.uploads)))?;
        let stem = rel
            .strip_suffix(MARKDOWN_EXT)
            .ok_or_else(|| invalid("must end with '.md'"))?;
        validate_relative(stem).map_err(|reason| invalid(reason))?;

        Ok(Self {
            source_key: source_key.to_string(),
            status_key: format!("{}{}{}", layout.status, stem, STATUS_EXT),
            output_prefix: format!("{}{}/", layout.generated, stem),
        })
    }

    /// Full key of the PDF once its filename is known.
    pub fn output_key(&self, filename: &str) -> String {
        format!("{}{}", self.output_prefix, filename)
    }
}

/// Upload key for a Markdown filename, optionally under an entity segment.
pub fn upload_key(layout: &KeyLayout, entity: Option<&str>, filename: &str) -> Result<String, Md2PdfError> {
    if !filename.ends_with(MARKDOWN_EXT) || filename.len() == MARKDOWN_EXT.len() {
        return Err(Md2PdfError::InvalidFilename {
            filename: filename.to_string(),
        });
    }
    if filename.contains('/') || filename.contains('\\') {
        return Err(Md2PdfError::InvalidFilename {
            filename: filename.to_string(),
        });
    }
    let key = match entity {
        Some(entity) => {
            validate_relative(entity).map_err(|reason| Md2PdfError::InvalidSourceKey {
                key: entity.to_string(),
                reason: reason.to_string(),
            })?;
            format!("{}{}/{}", layout.uploads, entity, filename)
        }
        None => format!("{}{}", layout.uploads, filename),
    };
    Ok(key)
}

/// Reject empty paths and `.`/`..`/empty segments.
fn validate_relative(rel: &str) -> Result<(), &'static str> {
    if rel.is_empty() {
        return Err("file name is empty");
    }
    if rel.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err("contains an empty, '.' or '..' path segment");
    }
    Ok(())
}
