//! Branding assets: the document name used in filenames and the optional
//! logo shown in the page header.
//!
//! The logo is an `Option<Logo>` on [`Branding`]: a configured logo turns the
//! header block on, `None` omits it entirely. Logos are embedded as base64
//! `data:` URIs so the print service never has to fetch them.

use crate::error::Md2PdfError;
use crate::styles::DEFAULT_HIGHLIGHT_STYLESHEET_URL;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Brand literal placed between the date and the client name in filenames.
pub const DEFAULT_DOCUMENT_NAME: &str = "SMEC AI Statement of Advice";

/// An embedded logo image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logo {
    data_uri: String,
    alt: String,
}

impl Logo {
    /// Wrap raw image bytes of the given MIME type.
    pub fn from_bytes(bytes: &[u8], mime: &str, alt: impl Into<String>) -> Self {
        Self {
            data_uri: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
            alt: alt.into(),
        }
    }

    /// Use an existing `data:` URI as-is.
    pub fn from_data_uri(uri: impl Into<String>, alt: impl Into<String>) -> Result<Self, Md2PdfError> {
        let uri = uri.into();
        if !uri.starts_with("data:image/") {
            return Err(Md2PdfError::InvalidConfig(format!(
                "logo must be a data:image/ URI, got '{}'",
                uri.chars().take(32).collect::<String>()
            )));
        }
        Ok(Self {
            data_uri: uri,
            alt: alt.into(),
        })
    }

    /// Load a PNG, JPEG, SVG or WebP logo from disk.
    pub async fn from_file(path: impl AsRef<Path>, alt: impl Into<String>) -> Result<Self, Md2PdfError> {
        let path = path.as_ref();
        let mime = mime_for_path(path).ok_or_else(|| {
            Md2PdfError::InvalidConfig(format!(
                "unsupported logo format '{}': use .png, .jpg, .svg or .webp",
                path.display()
            ))
        })?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| Md2PdfError::InputReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_bytes(&bytes, mime, alt))
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn alt(&self) -> &str {
        &self.alt
    }
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "svg" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Everything brand-specific that the assembler needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branding {
    /// Literal used in output filenames.
    pub document_name: String,
    /// Header logo; `None` omits the header block.
    pub logo: Option<Logo>,
    /// External highlight style sheet linked from `<head>`.
    pub highlight_stylesheet_url: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
            logo: None,
            highlight_stylesheet_url: DEFAULT_HIGHLIGHT_STYLESHEET_URL.to_string(),
        }
    }
}
