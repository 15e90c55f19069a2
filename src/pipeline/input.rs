//! Input validation: size limits and upload filenames.
//!
//! Validation is the first thing both entry points do. Submission rejects
//! bad content before anything is written to the store; the job runner
//! repeats the same check after fetching, since the store may be written by
//! other producers.

use crate::error::Md2PdfError;
use tracing::debug;

const BYTES_PER_MIB: usize = 1024 * 1024;

/// Reject whitespace-only content and content larger than `max_bytes`.
///
/// The size is the UTF-8 byte length, the same unit the upload limit uses.
pub fn validate_content(content: &str, max_bytes: usize) -> Result<(), Md2PdfError> {
    if content.trim().is_empty() {
        return Err(Md2PdfError::EmptyContent);
    }
    if content.len() > max_bytes {
        return Err(Md2PdfError::ContentTooLarge {
            size: content.len(),
            limit: max_bytes,
            limit_mib: max_bytes.div_ceil(BYTES_PER_MIB),
        });
    }
    debug!("Validated {} bytes of Markdown", content.len());
    Ok(())
}

/// Decode fetched bytes as UTF-8.
pub fn decode_source(key: &str, bytes: Vec<u8>) -> Result<String, Md2PdfError> {
    String::from_utf8(bytes).map_err(|_| Md2PdfError::ContentNotUtf8 {
        key: key.to_string(),
    })
}

/// Settle the upload filename: the caller's name if given (must end in
/// `.md`), otherwise `document-{unix millis}.md`.
pub fn upload_filename(requested: Option<&str>, now_millis: i64) -> Result<String, Md2PdfError> {
    match requested.map(str::trim) {
        Some(name) if !name.is_empty() => {
            let is_markdown = name
                .rsplit_once('.')
                .is_some_and(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("md"));
            if !is_markdown {
                return Err(Md2PdfError::InvalidFilename {
                    filename: name.to_string(),
                });
            }
            // Keys are case-sensitive; the trigger only accepts lowercase `.md`.
            let (stem, _) = name.rsplit_once('.').unwrap_or((name, ""));
            Ok(format!("{stem}.md"))
        }
        _ => Ok(format!("document-{now_millis}.md")),
    }
}
