//! Upload-triggered conversion jobs.
//!
//! ```text
//! UploadEvent
//!  │
//!  ├─ 1. Status   write `processing`
//!  ├─ 2. Fetch    read + validate the Markdown source
//!  ├─ 3. Render   normalise, extract metadata, Markdown → HTML
//!  ├─ 4. Assemble full document, footer, filename
//!  ├─ 5. Print    one engine session, always closed
//!  ├─ 6. Persist  PDF under the generated prefix
//!  └─ 7. Status   write `complete` with the PDF key
//! ```
//!
//! Any failure is caught once, in [`process_upload`]: the status key is
//! re-derived from the triggering event and an `error` record carrying the
//! error's message is written before the original error is returned.

use crate::config::ConversionConfig;
use crate::engine::{print_with_session, RenderEngine};
use crate::error::Md2PdfError;
use crate::keys::JobKeys;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::markdown::MarkdownRenderer;
use crate::pipeline::{assemble, input, metadata, normalize};
use crate::progress::JobStage;
use crate::status::{JobState, StatusRecord};
use crate::store::{save_json, ObjectStore, CONTENT_TYPE_PDF};
use crate::trigger::{parse_notification, UploadEvent};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything a job needs, shared by all jobs of a process.
#[derive(Clone)]
pub struct JobContext {
    pub store: Arc<dyn ObjectStore>,
    pub engine: Arc<dyn RenderEngine>,
    pub config: ConversionConfig,
    renderer: Arc<MarkdownRenderer>,
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JobContext {
    pub fn new(store: Arc<dyn ObjectStore>, engine: Arc<dyn RenderEngine>, config: ConversionConfig) -> Self {
        let renderer = Arc::new(MarkdownRenderer::new(&config));
        Self {
            store,
            engine,
            config,
            renderer,
        }
    }

    pub fn renderer(&self) -> &MarkdownRenderer {
        &self.renderer
    }

    fn stage_start(&self, job: &str, stage: JobStage) -> Instant {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage_start(job, stage);
        }
        Instant::now()
    }

    fn stage_done(&self, job: &str, stage: JobStage, started: Instant) -> u64 {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!("{}: {} stage took {}ms", job, stage, elapsed_ms);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage_complete(job, stage, elapsed_ms);
        }
        elapsed_ms
    }

    async fn write_status(&self, keys: &JobKeys, state: &JobState) -> Result<(), Md2PdfError> {
        let record = StatusRecord::now(state.clone());
        save_json(self.store.as_ref(), &keys.status_key, &record).await?;
        debug!("Status {} → {}", keys.status_key, state.name());
        Ok(())
    }
}

/// A finished job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub keys: JobKeys,
    /// `location` is the PDF's object key.
    pub output: ConversionOutput,
}

/// Result of one job in a batch.
#[derive(Debug)]
pub struct JobReport {
    pub event: UploadEvent,
    pub result: Result<JobOutcome, Md2PdfError>,
}

/// Run one job and record its terminal status.
///
/// On failure an `error` status is written (best-effort) and the original
/// error is returned.
pub async fn process_upload(event: &UploadEvent, ctx: &JobContext) -> Result<JobOutcome, Md2PdfError> {
    let job = event.key.as_str();
    match run_job(event, ctx).await {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            let message = err.to_string();
            error!("Job {} failed: {}", job, message);
            if let Some(ref cb) = ctx.config.progress_callback {
                cb.on_job_error(job, &message);
            }

            // Keys come from the event, not from whatever the failed run held.
            match JobKeys::from_source_key(&event.key, &ctx.config.key_layout) {
                Ok(keys) => {
                    let recorded = match JobState::begin().fail(message) {
                        Ok(failed) => ctx.write_status(&keys, &failed).await,
                        Err(e) => Err(e),
                    };
                    if let Err(write_err) = recorded {
                        warn!(
                            "Could not record failure for {} at {}: {}",
                            job, keys.status_key, write_err
                        );
                    }
                }
                Err(key_err) => warn!("No status record for {}: {}", job, key_err),
            }
            Err(err)
        }
    }
}

/// The job steps, without failure capture.
async fn run_job(event: &UploadEvent, ctx: &JobContext) -> Result<JobOutcome, Md2PdfError> {
    let total_start = Instant::now();
    let job = event.key.as_str();
    let config = &ctx.config;
    let keys = JobKeys::from_source_key(&event.key, &config.key_layout)?;
    info!("Starting job: {} (bucket {})", job, event.bucket);

    // ── Step 1: Mark processing ──────────────────────────────────────────
    let state = JobState::begin();
    ctx.write_status(&keys, &state).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_job_start(job);
    }

    // ── Step 2: Fetch and validate ───────────────────────────────────────
    let t = ctx.stage_start(job, JobStage::Fetch);
    let bytes = ctx
        .store
        .get(&keys.source_key)
        .await
        .map_err(Md2PdfError::from_source_fetch)?;
    let content = input::decode_source(&keys.source_key, bytes)?;
    input::validate_content(&content, config.max_content_bytes)?;
    ctx.stage_done(job, JobStage::Fetch, t);

    // ── Step 3: Extract metadata and render Markdown ─────────────────────
    let t = ctx.stage_start(job, JobStage::Render);
    let source = normalize::normalize_source(&content);
    let meta = metadata::extract(&source);
    let body = ctx.renderer.render_html(&source);
    let mut render_duration_ms = ctx.stage_done(job, JobStage::Render, t);
    info!(
        "{}: title '{}', client '{}', dated {}",
        job, meta.title, meta.client_name, meta.date_str
    );

    // ── Step 4: Assemble document ────────────────────────────────────────
    let t = ctx.stage_start(job, JobStage::Assemble);
    let html = assemble::build_full_html(&body, &meta, &config.branding);
    let footer = assemble::build_footer_template(&meta);
    let original_filename = event.key.rsplit('/').next().unwrap_or_default();
    let filename = assemble::build_pdf_filename(&meta, original_filename, &config.branding.document_name);
    render_duration_ms += ctx.stage_done(job, JobStage::Assemble, t);

    // ── Step 5: Print ────────────────────────────────────────────────────
    let t = ctx.stage_start(job, JobStage::Print);
    let pdf = print_with_session(ctx.engine.as_ref(), &html, &config.print.with_footer(footer)).await?;
    let print_duration_ms = ctx.stage_done(job, JobStage::Print, t);

    // ── Step 6: Persist PDF ──────────────────────────────────────────────
    let t = ctx.stage_start(job, JobStage::Persist);
    let output_key = keys.output_key(&filename);
    let pdf_bytes = pdf.len();
    ctx.store.put(&output_key, pdf, CONTENT_TYPE_PDF).await?;
    ctx.stage_done(job, JobStage::Persist, t);

    // ── Step 7: Mark complete ────────────────────────────────────────────
    let state = state.complete(output_key.clone())?;
    ctx.write_status(&keys, &state).await?;

    let stats = ConversionStats {
        source_bytes: content.len(),
        html_bytes: html.len(),
        pdf_bytes,
        render_duration_ms,
        print_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Job complete: {} → {} ({} bytes, {}ms total)",
        job, output_key, pdf_bytes, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_job_complete(job, &output_key, pdf_bytes);
    }

    Ok(JobOutcome {
        keys,
        output: ConversionOutput {
            metadata: meta,
            filename,
            location: output_key,
            stats,
        },
    })
}

/// Run several jobs concurrently, up to `config.concurrency` at a time.
///
/// Reports come back in completion order.
pub async fn process_events(events: Vec<UploadEvent>, ctx: &JobContext) -> Vec<JobReport> {
    let concurrency = ctx.config.concurrency.max(1);
    info!("Processing {} upload(s), concurrency {}", events.len(), concurrency);
    stream::iter(events)
        .map(|event| async move {
            let result = process_upload(&event, ctx).await;
            JobReport { event, result }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await
}

/// Decode an S3 notification payload and run every qualifying job.
pub async fn handle_notification(payload: &str, ctx: &JobContext) -> Result<Vec<JobReport>, Md2PdfError> {
    let events = parse_notification(payload, &ctx.config.key_layout)?;
    if events.is_empty() {
        warn!("Notification carried no Markdown uploads");
    }
    Ok(process_events(events, ctx).await)
}
