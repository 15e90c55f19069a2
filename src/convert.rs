//! Local conversion entry points.
//!
//! These run the same pure stages as an upload job but read from and write
//! to the local filesystem and never touch a status record:
//!
//! * [`render_document`] — stages only, no print engine (preview).
//! * [`inspect`] — metadata only.
//! * [`convert_file`] — Markdown file → PDF file through a [`RenderEngine`].

use crate::config::ConversionConfig;
use crate::engine::{print_with_session, RenderEngine};
use crate::error::Md2PdfError;
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, RenderedDocument};
use crate::pipeline::markdown::MarkdownRenderer;
use crate::pipeline::{assemble, input, metadata, normalize};
use crate::progress::JobStage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Run extraction, rendering and assembly on `markdown`.
///
/// Builds a fresh [`MarkdownRenderer`]; use [`render_document_with`] to
/// reuse one across documents.
pub fn render_document(markdown: &str, config: &ConversionConfig) -> Result<RenderedDocument, Md2PdfError> {
    render_document_with(&MarkdownRenderer::new(config), markdown, "document.md", config)
}

/// [`render_document`] with a caller-owned renderer.
///
/// `source_name` is the upload or file name the document came from.
pub fn render_document_with(
    renderer: &MarkdownRenderer,
    markdown: &str,
    source_name: &str,
    config: &ConversionConfig,
) -> Result<RenderedDocument, Md2PdfError> {
    input::validate_content(markdown, config.max_content_bytes)?;
    let source = normalize::normalize_source(markdown);
    let meta = metadata::extract(&source);
    let body = renderer.render_html(&source);

    Ok(RenderedDocument {
        html: assemble::build_full_html(&body, &meta, &config.branding),
        footer_template: assemble::build_footer_template(&meta),
        filename: assemble::build_pdf_filename(&meta, source_name, &config.branding.document_name),
        metadata: meta,
    })
}

/// Extract metadata from a local Markdown file without rendering it.
pub async fn inspect(path: impl AsRef<Path>) -> Result<DocumentMetadata, Md2PdfError> {
    let content = read_markdown(path.as_ref()).await?;
    Ok(metadata::extract(&normalize::normalize_source(&content)))
}

/// Convert a local Markdown file to a PDF file.
///
/// When `output` is an existing directory the PDF is written inside it
/// under the metadata-derived filename; otherwise `output` is the file path.
/// The write is atomic (temp file in the target directory, then rename).
pub async fn convert_file(
    input_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
    engine: &dyn RenderEngine,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    let total_start = Instant::now();
    let input_path = input_path.as_ref();
    let job = input_path.display().to_string();
    info!("Starting conversion: {}", job);

    let notify_start = |stage: JobStage| {
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage_start(&job, stage);
        }
        Instant::now()
    };
    let notify_done = |stage: JobStage, started: Instant| {
        let ms = started.elapsed().as_millis() as u64;
        debug!("{}: {} stage took {}ms", job, stage, ms);
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage_complete(&job, stage, ms);
        }
        ms
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_job_start(&job);
    }

    let result = async {
        // ── Step 1: Read ─────────────────────────────────────────────────
        let t = notify_start(JobStage::Fetch);
        let content = read_markdown(input_path).await?;
        notify_done(JobStage::Fetch, t);

        // ── Step 2: Render + assemble ────────────────────────────────────
        let t = notify_start(JobStage::Render);
        let source_name = input_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.md");
        let doc = render_document_with(&MarkdownRenderer::new(config), &content, source_name, config)?;
        let render_duration_ms = notify_done(JobStage::Render, t);

        // ── Step 3: Print ────────────────────────────────────────────────
        let t = notify_start(JobStage::Print);
        let options = config.print.with_footer(doc.footer_template.as_str());
        let pdf = print_with_session(engine, &doc.html, &options).await?;
        let print_duration_ms = notify_done(JobStage::Print, t);

        // ── Step 4: Write ────────────────────────────────────────────────
        let t = notify_start(JobStage::Persist);
        let target = resolve_output_path(output.as_ref(), &doc.filename).await;
        let pdf_bytes = pdf.len();
        write_atomic(&target, pdf).await?;
        notify_done(JobStage::Persist, t);

        let stats = ConversionStats {
            source_bytes: content.len(),
            html_bytes: doc.html.len(),
            pdf_bytes,
            render_duration_ms,
            print_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        Ok::<_, Md2PdfError>(ConversionOutput {
            metadata: doc.metadata,
            filename: doc.filename,
            location: target.display().to_string(),
            stats,
        })
    }
    .await;

    match result {
        Ok(out) => {
            info!(
                "Conversion complete: {} → {} ({} bytes, {}ms total)",
                job, out.location, out.stats.pdf_bytes, out.stats.total_duration_ms
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_job_complete(&job, &out.location, out.stats.pdf_bytes);
            }
            Ok(out)
        }
        Err(e) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_job_error(&job, &e.to_string());
            }
            Err(e)
        }
    }
}

async fn read_markdown(path: &Path) -> Result<String, Md2PdfError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| Md2PdfError::InputReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
    input::decode_source(&path.display().to_string(), bytes)
}

async fn resolve_output_path(output: &Path, filename: &str) -> PathBuf {
    match tokio::fs::metadata(output).await {
        Ok(meta) if meta.is_dir() => output.join(filename),
        _ => output.to_path_buf(),
    }
}

/// Write `bytes` to `path` via a temp file in the same directory.
async fn write_atomic(path: &Path, bytes: Vec<u8>) -> Result<(), Md2PdfError> {
    let write_err = |source: std::io::Error| Md2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir).await.map_err(write_err)?;

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".md2pdf-")
            .suffix(".pdf.tmp")
            .tempfile_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| Md2PdfError::Internal(format!("write task failed: {e}")))?
    .map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{PrintOptions, RenderSession};
    use async_trait::async_trait;

    struct EchoEngine;
    struct EchoSession;

    #[async_trait]
    impl RenderEngine for EchoEngine {
        async fn launch(&self) -> Result<Box<dyn RenderSession>, Md2PdfError> {
            Ok(Box::new(EchoSession))
        }
    }

    #[async_trait]
    impl RenderSession for EchoSession {
        async fn print_pdf(&mut self, html: &str, _o: &PrintOptions) -> Result<Vec<u8>, Md2PdfError> {
            Ok([b"%PDF-1.4\n".as_slice(), html.as_bytes()].concat())
        }

        async fn close(self: Box<Self>) -> Result<(), Md2PdfError> {
            Ok(())
        }
    }

    const DOC: &str = "# Review\n\n**Version 1.2**\n\n| **Prepared For** | Jo Bloggs |\n\n**Date:** May 2024\n";

    #[test]
    fn render_document_fills_every_part() {
        let doc = render_document(DOC, &ConversionConfig::default()).unwrap();
        assert_eq!(doc.metadata.title, "Review");
        assert_eq!(doc.metadata.client_name, "Jo Bloggs");
        assert_eq!(doc.filename, "2024-05-15 SMEC AI Statement of Advice - Jo Bloggs.pdf");
        assert!(doc.html.contains("<h1>Review</h1>"));
        assert!(doc.footer_template.contains("Version 1.2"));
    }

    #[test]
    fn render_document_rejects_blank_input() {
        let err = render_document("\n\n", &ConversionConfig::default()).unwrap_err();
        assert!(matches!(err, Md2PdfError::EmptyContent));
    }

    #[test]
    fn crlf_and_bom_do_not_break_title() {
        let doc = render_document("\u{feff}# Windows Title\r\n\r\nText\r\n", &ConversionConfig::default()).unwrap();
        assert_eq!(doc.metadata.title, "Windows Title");
    }

    #[tokio::test]
    async fn convert_into_directory_uses_derived_name() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("review.md");
        std::fs::write(&src, DOC).unwrap();
        let out_dir = dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();

        let out = convert_file(&src, &out_dir, &EchoEngine, &ConversionConfig::default())
            .await
            .unwrap();
        let expected = out_dir.join("2024-05-15 SMEC AI Statement of Advice - Jo Bloggs.pdf");
        assert_eq!(out.location, expected.display().to_string());
        assert!(std::fs::read(&expected).unwrap().starts_with(b"%PDF"));
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn convert_to_explicit_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.md");
        std::fs::write(&src, "# Hi\n").unwrap();
        let target = dir.path().join("nested/report.pdf");

        let out = convert_file(&src, &target, &EchoEngine, &ConversionConfig::default())
            .await
            .unwrap();
        assert!(target.is_file());
        assert_eq!(out.stats.pdf_bytes, std::fs::read(&target).unwrap().len());
    }

    #[tokio::test]
    async fn missing_input_is_reported() {
        let err = convert_file("/no/such/file.md", "/tmp/x.pdf", &EchoEngine, &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Md2PdfError::InputReadFailed { .. }));
    }

    #[tokio::test]
    async fn inspect_reads_metadata_only() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.md");
        std::fs::write(&src, DOC).unwrap();
        let meta = inspect(&src).await.unwrap();
        assert_eq!(meta.version, "1.2");
        assert_eq!(meta.date_str, "2024-05-15");
    }
}
