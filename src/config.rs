//! Configuration types for Markdown-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The config is constructed once at
//! process start and passed explicitly into every stage; nothing in the
//! pipeline reads ambient global state. Sharing one value across concurrent
//! jobs is cheap (`Clone` copies a few strings and an `Arc`).

use crate::branding::{Branding, Logo};
use crate::engine::PrintOptions;
use crate::error::Md2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default upload size limit: 10 MiB.
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 10 * 1024 * 1024;

/// Default syntect theme for fenced code blocks.
pub const DEFAULT_HIGHLIGHT_THEME: &str = "base16-ocean.dark";

/// Configuration for a Markdown-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use md2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .document_name("Acme Proposal")
///     .max_content_bytes(2 * 1024 * 1024)
///     .build()
///     .unwrap();
/// assert_eq!(config.branding.document_name, "Acme Proposal");
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Document name, logo and external highlight style sheet.
    pub branding: Branding,

    /// Name of the syntect theme used for fenced code blocks. Validated by
    /// [`ConversionConfigBuilder::build`].
    pub highlight_theme: String,

    /// Page geometry handed to the print service. The footer template is
    /// filled in per document.
    pub print: PrintOptions,

    /// Largest accepted Markdown source, in bytes. Default: 10 MiB.
    pub max_content_bytes: usize,

    /// Object-key prefixes for uploads, status records and generated PDFs.
    pub key_layout: KeyLayout,

    /// Interval between status polls in milliseconds. Default: 2000.
    pub poll_interval_ms: u64,

    /// Give up polling after this many seconds. `None` polls forever.
    pub poll_timeout_secs: Option<u64>,

    /// Jobs run concurrently when one notification carries several uploads.
    /// Default: 4.
    pub concurrency: usize,

    /// Optional stage-level progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            branding: Branding::default(),
            highlight_theme: DEFAULT_HIGHLIGHT_THEME.to_string(),
            print: PrintOptions::default(),
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
            key_layout: KeyLayout::default(),
            poll_interval_ms: 2000,
            poll_timeout_secs: None,
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("document_name", &self.branding.document_name)
            .field("logo", &self.branding.logo.as_ref().map(|l| l.alt()))
            .field("highlight_theme", &self.highlight_theme)
            .field("print", &self.print)
            .field("max_content_bytes", &self.max_content_bytes)
            .field("key_layout", &self.key_layout)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn JobProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn document_name(mut self, name: impl Into<String>) -> Self {
        self.config.branding.document_name = name.into();
        self
    }

    pub fn logo(mut self, logo: Logo) -> Self {
        self.config.branding.logo = Some(logo);
        self
    }

    pub fn highlight_stylesheet_url(mut self, url: impl Into<String>) -> Self {
        self.config.branding.highlight_stylesheet_url = url.into();
        self
    }

    pub fn branding(mut self, branding: Branding) -> Self {
        self.config.branding = branding;
        self
    }

    pub fn highlight_theme(mut self, theme: impl Into<String>) -> Self {
        self.config.highlight_theme = theme.into();
        self
    }

    pub fn print_options(mut self, print: PrintOptions) -> Self {
        self.config.print = print;
        self
    }

    pub fn max_content_bytes(mut self, n: usize) -> Self {
        self.config.max_content_bytes = n;
        self
    }

    pub fn key_layout(mut self, layout: KeyLayout) -> Self {
        self.config.key_layout = layout;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms.max(10);
        self
    }

    pub fn poll_timeout_secs(mut self, secs: u64) -> Self {
        self.config.poll_timeout_secs = Some(secs);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        let c = &self.config;
        if c.branding.document_name.trim().is_empty() {
            return Err(Md2PdfError::InvalidConfig(
                "document name must not be empty".into(),
            ));
        }
        if c.max_content_bytes == 0 {
            return Err(Md2PdfError::InvalidConfig(
                "max content size must be ≥ 1 byte".into(),
            ));
        }
        if c.print.format.trim().is_empty() {
            return Err(Md2PdfError::InvalidConfig("page format must not be empty".into()));
        }
        if !crate::pipeline::highlight::theme_exists(&c.highlight_theme) {
            return Err(Md2PdfError::InvalidConfig(format!(
                "unknown highlight theme '{}'",
                c.highlight_theme
            )));
        }
        c.key_layout.validate()?;
        Ok(self.config)
    }
}

// ── Key layout ───────────────────────────────────────────────────────────

/// Top-level prefixes of the three object families.
///
/// Every job key is derived from the upload key by swapping the prefix, so
/// uploads, status records and PDFs correlate without an index. See
/// [`crate::keys::JobKeys`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLayout {
    pub uploads: String,
    pub status: String,
    pub generated: String,
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self {
            uploads: "uploads/".into(),
            status: "status/".into(),
            generated: "generated/".into(),
        }
    }
}

impl KeyLayout {
    fn validate(&self) -> Result<(), Md2PdfError> {
        let prefixes = [&self.uploads, &self.status, &self.generated];
        for p in prefixes {
            if p.len() < 2 || !p.ends_with('/') || p.starts_with('/') {
                return Err(Md2PdfError::InvalidConfig(format!(
                    "key prefix '{p}' must be non-empty, relative and end with '/'"
                )));
            }
        }
        if self.uploads == self.status || self.uploads == self.generated || self.status == self.generated {
            return Err(Md2PdfError::InvalidConfig(
                "uploads, status and generated prefixes must differ".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_builds() {
        let config = ConversionConfig::builder().build().unwrap();
        assert_eq!(config.max_content_bytes, 10 * 1024 * 1024);
        assert_eq!(config.print.format, "A4");
        assert!(config.branding.logo.is_none());
    }

    #[test]
    fn empty_document_name_is_rejected() {
        let err = ConversionConfig::builder().document_name("  ").build().unwrap_err();
        assert!(matches!(err, Md2PdfError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_theme_is_rejected() {
        let err = ConversionConfig::builder()
            .highlight_theme("no-such-theme")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("no-such-theme"));
    }

    #[test]
    fn overlapping_prefixes_are_rejected() {
        let layout = KeyLayout {
            uploads: "in/".into(),
            status: "in/".into(),
            generated: "out/".into(),
        };
        assert!(ConversionConfig::builder().key_layout(layout).build().is_err());
    }

    #[test]
    fn prefix_without_slash_is_rejected() {
        let layout = KeyLayout {
            uploads: "uploads".into(),
            ..KeyLayout::default()
        };
        assert!(ConversionConfig::builder().key_layout(layout).build().is_err());
    }

    #[test]
    fn concurrency_is_clamped() {
        let config = ConversionConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn debug_hides_callback_internals() {
        let s = format!("{:?}", ConversionConfig::default());
        assert!(s.contains("highlight_theme"));
        assert!(s.contains("progress_callback: None"));
    }
}
