//! End-to-end integration tests for md2pdf.
//!
//! Most tests run the whole upload workflow against the in-memory or
//! filesystem store with a fake print engine, and the HTTP engine against a
//! `wiremock` server. The live test at the bottom talks to a real
//! headless-Chrome print service and is gated behind `MD2PDF_E2E_ENDPOINT`.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture
//!
//! Against a print service:
//!   MD2PDF_E2E_ENDPOINT=http://localhost:3000 cargo test --test e2e live -- --nocapture

use async_trait::async_trait;
use md2pdf::{
    handle_notification, print_with_session, process_upload, submit_markdown, wait_for_status, ConversionConfig,
    FsObjectStore, HttpRenderEngine, JobContext, JobProgressCallback, JobStage, JobState, Logo, MemoryObjectStore,
    Md2PdfError, ObjectStore, PrintOptions, RenderEngine, RenderSession, StatusRecord, UploadEvent,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Test helpers ─────────────────────────────────────────────────────────

const STATEMENT: &str = "\
# Statement of Advice

**Version 3.1**

| Field | Value |
|-------|-------|
| **Prepared For** | Jane Citizen |
| **Documentation Date** | December 15, 2025 |

## Recommendations

Review https://example.com/terms before signing.

```rust
fn main() { println!(\"hi\"); }
```
";

const EXPECTED_PDF_NAME: &str = "2025-12-15 SMEC AI Statement of Advice - Jane Citizen.pdf";

/// Print engine that records every session and echoes a tiny PDF.
#[derive(Default)]
struct RecordingEngine {
    fail_with: Option<String>,
    launched: AtomicUsize,
    closed: Arc<AtomicUsize>,
    printed: Arc<Mutex<Vec<(String, PrintOptions)>>>,
}

struct RecordingSession {
    fail_with: Option<String>,
    closed: Arc<AtomicUsize>,
    printed: Arc<Mutex<Vec<(String, PrintOptions)>>>,
}

#[async_trait]
impl RenderEngine for RecordingEngine {
    async fn launch(&self) -> Result<Box<dyn RenderSession>, Md2PdfError> {
        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingSession {
            fail_with: self.fail_with.clone(),
            closed: Arc::clone(&self.closed),
            printed: Arc::clone(&self.printed),
        }))
    }
}

#[async_trait]
impl RenderSession for RecordingSession {
    async fn print_pdf(&mut self, html: &str, options: &PrintOptions) -> Result<Vec<u8>, Md2PdfError> {
        if let Some(ref msg) = self.fail_with {
            return Err(Md2PdfError::RenderEngine(msg.clone()));
        }
        self.printed
            .lock()
            .unwrap()
            .push((html.to_string(), options.clone()));
        Ok(b"%PDF-1.7\n%fake\n".to_vec())
    }

    async fn close(self: Box<Self>) -> Result<(), Md2PdfError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn context_with(store: Arc<dyn ObjectStore>, engine: Arc<RecordingEngine>, config: ConversionConfig) -> JobContext {
    JobContext::new(store, engine, config)
}

async fn read_status(store: &dyn ObjectStore, key: &str) -> StatusRecord {
    md2pdf::load_json(store, key).await.unwrap()
}

// ── Upload workflow ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_submit_process_and_poll() {
    let store = Arc::new(MemoryObjectStore::new());
    let engine = Arc::new(RecordingEngine::default());
    let config = ConversionConfig::builder().poll_interval_ms(10).build().unwrap();
    let ctx = context_with(store.clone(), engine.clone(), config.clone());

    let keys = assert_ok!(
        submit_markdown(&*store, &config, Some("client-7"), Some("soa.md"), STATEMENT).await
    );
    assert_eq!(keys.source_key, "uploads/client-7/soa.md");

    let outcome = assert_ok!(process_upload(&UploadEvent::new("bucket", &keys.source_key), &ctx).await);
    let expected_key = format!("generated/client-7/soa/{EXPECTED_PDF_NAME}");
    assert_eq!(outcome.output.location, expected_key);
    assert_eq!(outcome.output.metadata.version, "3.1");

    let record = assert_ok!(wait_for_status(&*store, &keys.status_key, &config).await);
    assert_eq!(record.state, JobState::Complete { pdf_key: expected_key.clone() });
    assert!(store.get(&expected_key).await.unwrap().starts_with(b"%PDF"));

    assert_eq!(engine.launched.load(Ordering::SeqCst), 1);
    assert_eq!(engine.closed.load(Ordering::SeqCst), 1);

    let printed = engine.printed.lock().unwrap();
    let (html, options) = &printed[0];
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Statement of Advice</title>"));
    assert!(html.contains("<pre class=\"hljs\"><code>"));
    assert!(html.contains("<a href=\"https://example.com/terms\">"));
    assert!(!html.contains("page-header"), "no logo configured");
    assert_eq!(options.format, "A4");
    assert!(options.footer_template.contains("Version 3.1 |"));
    assert!(options.footer_template.contains("class=\"totalPages\""));
}

#[tokio::test]
async fn test_engine_failure_leaves_error_status_only() {
    let store = Arc::new(MemoryObjectStore::new());
    let engine = Arc::new(RecordingEngine {
        fail_with: Some("Target closed".into()),
        ..RecordingEngine::default()
    });
    let ctx = context_with(store.clone(), engine.clone(), ConversionConfig::default());
    store
        .put("uploads/soa.md", STATEMENT.as_bytes().to_vec(), "text/markdown")
        .await
        .unwrap();

    let err = assert_err!(process_upload(&UploadEvent::new("bucket", "uploads/soa.md"), &ctx).await);
    assert!(err.to_string().contains("Target closed"));

    let record = read_status(&*store, "status/soa.json").await;
    match record.state {
        JobState::Error { ref error } => assert!(!error.is_empty()),
        ref other => panic!("expected error, got {other:?}"),
    }
    assert_eq!(engine.closed.load(Ordering::SeqCst), 1, "session must be released");
    assert!(!store.keys().await.iter().any(|k| k.starts_with("generated/")));
}

#[tokio::test]
async fn test_oversized_submission_is_rejected_before_upload() {
    let store = MemoryObjectStore::new();
    let config = ConversionConfig::default();
    let big = "x".repeat(10 * 1024 * 1024 + 1);

    let err = assert_err!(submit_markdown(&store, &config, None, Some("big.md"), &big).await);
    assert!(err.to_string().contains("Maximum size is 10MB"), "got: {err}");

    let err = assert_err!(submit_markdown(&store, &config, None, Some("blank.md"), "   ").await);
    assert_eq!(err.to_string(), "No markdown content provided");

    assert!(store.keys().await.is_empty());
}

#[tokio::test]
async fn test_oversized_object_fails_job() {
    let store = Arc::new(MemoryObjectStore::new());
    let engine = Arc::new(RecordingEngine::default());
    let config = ConversionConfig::builder().max_content_bytes(16).build().unwrap();
    let ctx = context_with(store.clone(), engine.clone(), config);
    store
        .put("uploads/big.md", STATEMENT.as_bytes().to_vec(), "text/markdown")
        .await
        .unwrap();

    let err = assert_err!(process_upload(&UploadEvent::new("b", "uploads/big.md"), &ctx).await);
    assert!(matches!(err, Md2PdfError::ContentTooLarge { .. }));
    assert!(matches!(
        read_status(&*store, "status/big.json").await.state,
        JobState::Error { .. }
    ));
    assert_eq!(engine.launched.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_notification_batch_on_filesystem_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsObjectStore::new(dir.path()));
    let engine = Arc::new(RecordingEngine::default());
    let ctx = context_with(store.clone(), engine.clone(), ConversionConfig::default());

    store
        .put("uploads/team a/one.md", b"# One\n\n**Client:** Alpha\n".to_vec(), "text/markdown")
        .await
        .unwrap();
    store
        .put("uploads/two.md", b"# Two\n".to_vec(), "text/markdown")
        .await
        .unwrap();

    let payload = json!({
        "Records": [
            {"eventName": "ObjectCreated:Put", "s3": {"bucket": {"name": "docs"}, "object": {"key": "uploads/team+a/one.md"}}},
            {"eventName": "ObjectCreated:Put", "s3": {"bucket": {"name": "docs"}, "object": {"key": "uploads/two.md"}}},
            {"eventName": "ObjectCreated:Put", "s3": {"bucket": {"name": "docs"}, "object": {"key": "generated/two/x.pdf"}}}
        ]
    })
    .to_string();

    let reports = assert_ok!(handle_notification(&payload, &ctx).await);
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.result.is_ok()));

    let one = read_status(&*store, "status/team a/one.json").await;
    match one.state {
        JobState::Complete { ref pdf_key } => {
            assert!(pdf_key.starts_with("generated/team a/one/"));
            assert!(pdf_key.ends_with("SMEC AI Statement of Advice - Alpha.pdf"));
            assert!(dir.path().join(pdf_key).is_file());
        }
        ref other => panic!("expected complete, got {other:?}"),
    }
    assert!(read_status(&*store, "status/two.json").await.is_terminal());
    assert_eq!(engine.closed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_logo_header_reaches_print_service() {
    let store = Arc::new(MemoryObjectStore::new());
    let engine = Arc::new(RecordingEngine::default());
    let config = ConversionConfig::builder()
        .logo(Logo::from_bytes(b"<svg/>", "image/svg+xml", "Acme"))
        .document_name("Acme Report")
        .build()
        .unwrap();
    let ctx = context_with(store.clone(), engine.clone(), config);
    store
        .put("uploads/r.md", b"# Quarterly\n\n**Version 4**\n".to_vec(), "text/markdown")
        .await
        .unwrap();

    let outcome = assert_ok!(process_upload(&UploadEvent::new("b", "uploads/r.md"), &ctx).await);
    assert!(outcome.output.filename.ends_with(" Acme Report.pdf"));

    let printed = engine.printed.lock().unwrap();
    let html = &printed[0].0;
    assert!(html.contains("<div class=\"page-header\">"));
    assert!(html.contains("Version 4"));
    assert!(html.contains("alt=\"Acme\""));
}

#[derive(Default)]
struct StageLog {
    events: Mutex<Vec<String>>,
}

impl JobProgressCallback for StageLog {
    fn on_job_start(&self, _job: &str) {
        self.events.lock().unwrap().push("start".into());
    }

    fn on_stage_complete(&self, _job: &str, stage: JobStage, _elapsed_ms: u64) {
        self.events.lock().unwrap().push(stage.to_string());
    }

    fn on_job_complete(&self, _job: &str, _location: &str, _pdf_bytes: usize) {
        self.events.lock().unwrap().push("complete".into());
    }
}

#[tokio::test]
async fn test_progress_events_follow_stage_order() {
    let log = Arc::new(StageLog::default());
    let store = Arc::new(MemoryObjectStore::new());
    let config = ConversionConfig::builder()
        .progress_callback(log.clone() as Arc<dyn JobProgressCallback>)
        .build()
        .unwrap();
    let ctx = context_with(store.clone(), Arc::new(RecordingEngine::default()), config);
    store.put("uploads/a.md", b"# A\n".to_vec(), "text/markdown").await.unwrap();

    assert_ok!(process_upload(&UploadEvent::new("b", "uploads/a.md"), &ctx).await);
    assert_eq!(
        *log.events.lock().unwrap(),
        vec!["start", "fetch", "render", "assemble", "print", "persist", "complete"]
    );
}

/// Reads the job's status record while the print is in flight.
struct StatusReadingEngine {
    store: Arc<MemoryObjectStore>,
    status_key: String,
    seen: Arc<Mutex<Vec<JobState>>>,
}

struct StatusReadingSession {
    store: Arc<MemoryObjectStore>,
    status_key: String,
    seen: Arc<Mutex<Vec<JobState>>>,
}

#[async_trait]
impl RenderEngine for StatusReadingEngine {
    async fn launch(&self) -> Result<Box<dyn RenderSession>, Md2PdfError> {
        Ok(Box::new(StatusReadingSession {
            store: Arc::clone(&self.store),
            status_key: self.status_key.clone(),
            seen: Arc::clone(&self.seen),
        }))
    }
}

#[async_trait]
impl RenderSession for StatusReadingSession {
    async fn print_pdf(&mut self, _html: &str, _options: &PrintOptions) -> Result<Vec<u8>, Md2PdfError> {
        let record = read_status(&*self.store, &self.status_key).await;
        self.seen.lock().unwrap().push(record.state);
        Ok(b"%PDF-1.7\n".to_vec())
    }

    async fn close(self: Box<Self>) -> Result<(), Md2PdfError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_status_is_processing_while_printing() {
    let store = Arc::new(MemoryObjectStore::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let engine = Arc::new(StatusReadingEngine {
        store: store.clone(),
        status_key: "status/acme/plan.json".into(),
        seen: seen.clone(),
    });
    let ctx = JobContext::new(store.clone(), engine, ConversionConfig::default());
    store
        .put("uploads/acme/plan.md", STATEMENT.as_bytes().to_vec(), "text/markdown")
        .await
        .unwrap();

    assert_ok!(process_upload(&UploadEvent::new("b", "uploads/acme/plan.md"), &ctx).await);

    assert_eq!(*seen.lock().unwrap(), vec![JobState::Processing]);
    assert!(matches!(
        read_status(&*store, "status/acme/plan.json").await.state,
        JobState::Complete { .. }
    ));
}

// ── HTTP print service ───────────────────────────────────────────────────

#[tokio::test]
async fn test_http_engine_posts_html_and_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pdf"))
        .and(query_param("token", "s3cret"))
        .and(body_partial_json(json!({
            "html": "<p>hello</p>",
            "options": {
                "format": "A4",
                "printBackground": true,
                "displayHeaderFooter": true,
                "headerTemplate": "<div></div>",
                "footerTemplate": "<div>f</div>",
                "margin": {"top": "0.5in", "bottom": "0.75in"}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 mock".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let engine = HttpRenderEngine::new(server.uri()).with_token("s3cret");
    let pdf = assert_ok!(
        print_with_session(&engine, "<p>hello</p>", &PrintOptions::default().with_footer("<div>f</div>")).await
    );
    assert_eq!(pdf, b"%PDF-1.7 mock");
}

#[tokio::test]
async fn test_http_engine_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pdf"))
        .respond_with(ResponseTemplate::new(500).set_body_string("chrome crashed"))
        .mount(&server)
        .await;

    let engine = HttpRenderEngine::new(server.uri());
    let err = assert_err!(print_with_session(&engine, "<p>x</p>", &PrintOptions::default()).await);
    let msg = err.to_string();
    assert!(msg.contains("HTTP 500"), "got: {msg}");
    assert!(msg.contains("chrome crashed"), "got: {msg}");
}

#[tokio::test]
async fn test_http_engine_rejects_non_pdf_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let engine = HttpRenderEngine::new(server.uri());
    let err = assert_err!(print_with_session(&engine, "<p>x</p>", &PrintOptions::default()).await);
    assert!(matches!(err, Md2PdfError::RenderEngine(_)));
}

// ── Live print service ───────────────────────────────────────────────────

#[tokio::test]
async fn test_live_print_service() {
    let Ok(endpoint) = std::env::var("MD2PDF_E2E_ENDPOINT") else {
        println!("SKIP: set MD2PDF_E2E_ENDPOINT=http://host:port to run the live test");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("soa.md");
    std::fs::write(&src, STATEMENT).unwrap();

    let engine = HttpRenderEngine::new(endpoint);
    let out = md2pdf::convert_file(&src, dir.path(), &engine, &ConversionConfig::default())
        .await
        .expect("live conversion failed");
    println!("wrote {} ({} bytes)", out.location, out.stats.pdf_bytes);
    assert_eq!(out.filename, EXPECTED_PDF_NAME);
    assert!(std::fs::read(&out.location).unwrap().starts_with(b"%PDF"));
}
