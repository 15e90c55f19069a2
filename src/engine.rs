//! Print engine: turn an assembled HTML document into PDF bytes.
//!
//! The headless browser is an external collaborator. The pipeline only sees
//! two narrow traits:
//!
//! * [`RenderEngine`] — a factory that launches a [`RenderSession`].
//! * [`RenderSession`] — one scoped browser session. It prints exactly the
//!   documents handed to it and must be [`close`](RenderSession::close)d on
//!   every exit path, success or failure. [`print_with_session`] is the one
//!   place that guarantees this.
//!
//! [`HttpRenderEngine`] talks to a headless-Chrome print service over the
//! browserless-style `POST /pdf` protocol, whose `options` object is the
//! Puppeteer `page.pdf()` option set.

use crate::error::Md2PdfError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

// ── Print parameters ─────────────────────────────────────────────────────

/// Page margins as CSS lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: "0.5in".into(),
            right: "0.5in".into(),
            bottom: "0.75in".into(),
            left: "0.5in".into(),
        }
    }
}

/// Print parameters, serialised with the Puppeteer field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOptions {
    /// Paper format, e.g. `"A4"`.
    pub format: String,
    pub margin: Margins,
    pub print_background: bool,
    pub display_header_footer: bool,
    /// Blank header: an empty element suppresses Chrome's default title/URL header.
    pub header_template: String,
    /// Footer with `pageNumber` / `totalPages` placeholders.
    pub footer_template: String,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            format: "A4".into(),
            margin: Margins::default(),
            print_background: true,
            display_header_footer: true,
            header_template: "<div></div>".into(),
            footer_template: String::new(),
        }
    }
}

impl PrintOptions {
    /// Same geometry, with the given footer.
    pub fn with_footer(&self, footer_template: impl Into<String>) -> Self {
        Self {
            footer_template: footer_template.into(),
            ..self.clone()
        }
    }
}

// ── Traits ───────────────────────────────────────────────────────────────

/// Launches print sessions.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Acquire a session. Every session returned here must be closed.
    async fn launch(&self) -> Result<Box<dyn RenderSession>, Md2PdfError>;
}

/// One scoped browser session.
#[async_trait]
pub trait RenderSession: Send {
    /// Print `html` to PDF bytes.
    async fn print_pdf(&mut self, html: &str, options: &PrintOptions) -> Result<Vec<u8>, Md2PdfError>;

    /// Release the session.
    async fn close(self: Box<Self>) -> Result<(), Md2PdfError>;
}

/// Launch a session, print once, and close the session whatever happened.
///
/// A print failure wins over a close failure; a close failure after a
/// successful print is logged and not surfaced, since the PDF is already in
/// hand.
pub async fn print_with_session(
    engine: &dyn RenderEngine,
    html: &str,
    options: &PrintOptions,
) -> Result<Vec<u8>, Md2PdfError> {
    let mut session = engine.launch().await?;
    let printed = session.print_pdf(html, options).await;
    if let Err(e) = session.close().await {
        warn!("Failed to close render session: {}", e);
    }
    let bytes = printed?;
    if !bytes.starts_with(b"%PDF") {
        return Err(Md2PdfError::RenderEngine(format!(
            "print service returned {} bytes that are not a PDF",
            bytes.len()
        )));
    }
    Ok(bytes)
}

// ── HTTP print service ───────────────────────────────────────────────────

/// Request body of the `POST /pdf` endpoint.
#[derive(Debug, Serialize)]
struct PdfRequest<'a> {
    html: &'a str,
    options: &'a PrintOptions,
}

/// A headless-Chrome print service reachable over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRenderEngine {
    endpoint: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpRenderEngine {
    /// `endpoint` is the service base URL, e.g. `http://localhost:3000`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn pdf_url(&self) -> String {
        format!("{}/pdf", self.endpoint)
    }
}

#[async_trait]
impl RenderEngine for HttpRenderEngine {
    async fn launch(&self) -> Result<Box<dyn RenderSession>, Md2PdfError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Md2PdfError::RenderEngine(format!("failed to build HTTP client: {e}")))?;
        debug!("Opened print session against {}", self.endpoint);
        Ok(Box::new(HttpRenderSession {
            client,
            url: self.pdf_url(),
            token: self.token.clone(),
            timeout_secs: self.timeout.as_secs(),
        }))
    }
}

struct HttpRenderSession {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    timeout_secs: u64,
}

#[async_trait]
impl RenderSession for HttpRenderSession {
    async fn print_pdf(&mut self, html: &str, options: &PrintOptions) -> Result<Vec<u8>, Md2PdfError> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&PdfRequest { html, options });
        if let Some(ref token) = self.token {
            request = request.query(&[("token", token)]);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Md2PdfError::RenderEngine(format!(
                    "print request timed out after {}s",
                    self.timeout_secs
                ))
            } else {
                Md2PdfError::RenderEngine(format!("print request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.chars().take(200).collect();
            return Err(Md2PdfError::RenderEngine(format!(
                "print service returned HTTP {status}: {detail}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Md2PdfError::RenderEngine(format!("failed to read PDF body: {e}")))?;
        info!("Print service returned {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn close(self: Box<Self>) -> Result<(), Md2PdfError> {
        debug!("Closed print session against {}", self.url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn default_geometry_is_a4_with_fixed_margins() {
        let opts = PrintOptions::default();
        assert_eq!(opts.format, "A4");
        assert_eq!(opts.margin.top, "0.5in");
        assert_eq!(opts.margin.right, "0.5in");
        assert_eq!(opts.margin.bottom, "0.75in");
        assert_eq!(opts.margin.left, "0.5in");
        assert!(opts.print_background);
        assert!(opts.display_header_footer);
    }

    #[test]
    fn options_serialise_with_puppeteer_names() {
        let json = serde_json::to_value(PrintOptions::default().with_footer("<div>f</div>")).unwrap();
        assert_eq!(json["printBackground"], true);
        assert_eq!(json["displayHeaderFooter"], true);
        assert_eq!(json["footerTemplate"], "<div>f</div>");
        assert_eq!(json["margin"]["bottom"], "0.75in");
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let engine = HttpRenderEngine::new("http://print:3000/");
        assert_eq!(engine.pdf_url(), "http://print:3000/pdf");
    }

    struct CountingEngine {
        closed: Arc<AtomicUsize>,
        result: fn() -> Result<Vec<u8>, Md2PdfError>,
    }

    struct CountingSession {
        closed: Arc<AtomicUsize>,
        result: fn() -> Result<Vec<u8>, Md2PdfError>,
    }

    #[async_trait]
    impl RenderEngine for CountingEngine {
        async fn launch(&self) -> Result<Box<dyn RenderSession>, Md2PdfError> {
            Ok(Box::new(CountingSession {
                closed: Arc::clone(&self.closed),
                result: self.result,
            }))
        }
    }

    #[async_trait]
    impl RenderSession for CountingSession {
        async fn print_pdf(&mut self, _html: &str, _o: &PrintOptions) -> Result<Vec<u8>, Md2PdfError> {
            (self.result)()
        }

        async fn close(self: Box<Self>) -> Result<(), Md2PdfError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn session_closed_after_success() {
        let closed = Arc::new(AtomicUsize::new(0));
        let engine = CountingEngine {
            closed: Arc::clone(&closed),
            result: || Ok(b"%PDF-1.7 ok".to_vec()),
        };
        let bytes = print_with_session(&engine, "<p>x</p>", &PrintOptions::default())
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn session_closed_after_failure() {
        let closed = Arc::new(AtomicUsize::new(0));
        let engine = CountingEngine {
            closed: Arc::clone(&closed),
            result: || Err(Md2PdfError::RenderEngine("browser crashed".into())),
        };
        let err = print_with_session(&engine, "<p>x</p>", &PrintOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("browser crashed"));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_pdf_body_is_rejected() {
        let closed = Arc::new(AtomicUsize::new(0));
        let engine = CountingEngine {
            closed: Arc::clone(&closed),
            result: || Ok(b"<html>error page</html>".to_vec()),
        };
        let err = print_with_session(&engine, "<p>x</p>", &PrintOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Md2PdfError::RenderEngine(_)));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
