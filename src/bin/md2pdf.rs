//! CLI binary for md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, wires up the filesystem store and the HTTP print
//! service, and prints results.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use md2pdf::{
    convert_file, handle_notification, inspect, render_document, submit_markdown, wait_for_status,
    ConversionConfig, FsObjectStore, HttpRenderEngine, JobContext, JobProgressCallback, JobStage,
    JobState, Logo, ProgressCallback, StatusRecord,
};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────

/// Spinner that logs one line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl JobProgressCallback for CliProgressCallback {
    fn on_job_start(&self, job: &str) {
        self.bar.set_prefix("Converting");
        self.bar.println(format!("{} {}", cyan("◆"), bold(job)));
    }

    fn on_stage_start(&self, _job: &str, stage: JobStage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, _job: &str, stage: JobStage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<9} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.2}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_job_complete(&self, _job: &str, location: &str, pdf_bytes: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(location),
            dim(&format!("{pdf_bytes} bytes"))
        );
    }

    fn on_job_error(&self, _job: &str, error: &str) {
        self.bar.finish_and_clear();
        let msg = if error.chars().count() > 100 {
            format!("{}\u{2026}", error.chars().take(99).collect::<String>())
        } else {
            error.to_string()
        };
        eprintln!("{} {}", red("✘"), red(&msg));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a local file; the PDF is named from the document's metadata
  md2pdf convert proposal.md -o out/

  # Show what would be extracted
  md2pdf inspect proposal.md

  # Write the assembled HTML for a browser preview
  md2pdf preview proposal.md -o preview.html

  # Upload into the store and wait for the job to finish
  md2pdf --store-dir ./bucket submit proposal.md --entity acme --wait

  # Run the jobs of an S3 notification
  md2pdf --store-dir ./bucket process-event notification.json

  # Read a job's status record
  md2pdf --store-dir ./bucket status status/acme/proposal.json

ENVIRONMENT VARIABLES:
  MD2PDF_ENGINE_URL      Print service base URL (POST {url}/pdf)
  MD2PDF_ENGINE_TOKEN    Print service token
  MD2PDF_STORE_DIR       Root directory of the object store
  MD2PDF_DOCUMENT_NAME   Brand literal used in PDF filenames
  MD2PDF_LOGO            Logo image (.png, .jpg, .svg, .webp) for the page header
  RUST_LOG               Override the log filter
"#;

/// Convert Markdown documents to branded, paginated PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert Markdown documents to branded, paginated PDFs",
    long_about = "Convert Markdown documents to branded PDFs through a headless-browser print \
service. Runs local conversions, or drives upload jobs against a directory-backed object store \
with pollable status records.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Print service base URL.
    #[arg(long, global = true, env = "MD2PDF_ENGINE_URL", default_value = "http://localhost:3000")]
    engine_url: String,

    /// Print service token, sent as `?token=`.
    #[arg(long, global = true, env = "MD2PDF_ENGINE_TOKEN", hide_env_values = true)]
    engine_token: Option<String>,

    /// Print request timeout in seconds.
    #[arg(long, global = true, env = "MD2PDF_ENGINE_TIMEOUT", default_value_t = 120)]
    engine_timeout: u64,

    /// Root directory of the object store.
    #[arg(long, global = true, env = "MD2PDF_STORE_DIR", default_value = ".")]
    store_dir: PathBuf,

    /// Brand literal placed in PDF filenames.
    #[arg(long, global = true, env = "MD2PDF_DOCUMENT_NAME")]
    document_name: Option<String>,

    /// Logo image shown in the page header.
    #[arg(long, global = true, env = "MD2PDF_LOGO")]
    logo: Option<PathBuf>,

    /// syntect theme for code blocks.
    #[arg(long, global = true, env = "MD2PDF_THEME")]
    theme: Option<String>,

    /// Largest accepted Markdown source, in MiB.
    #[arg(long, global = true, env = "MD2PDF_MAX_SIZE_MIB", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..=1024))]
    max_size_mib: u64,

    /// Concurrent jobs per notification.
    #[arg(short, long, global = true, env = "MD2PDF_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Status poll interval in milliseconds.
    #[arg(long, global = true, env = "MD2PDF_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Give up waiting for a status after this many seconds.
    #[arg(long, global = true, env = "MD2PDF_POLL_TIMEOUT")]
    poll_timeout: Option<u64>,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "MD2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "MD2PDF_LOG_JSON")]
    log_json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a local Markdown file to PDF.
    Convert {
        input: PathBuf,
        /// Output file, or a directory to use the derived filename. Default: current directory.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Print the conversion result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the metadata extracted from a Markdown file.
    Inspect {
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Write the assembled HTML document without printing it.
    Preview {
        input: PathBuf,
        /// Write HTML here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload Markdown into the store (`-` reads stdin).
    Submit {
        input: String,
        /// Upload filename; defaults to the input's file name.
        #[arg(long)]
        name: Option<String>,
        /// Entity segment mirrored into status and output keys.
        #[arg(long)]
        entity: Option<String>,
        /// Poll the status record until the job finishes.
        #[arg(long)]
        wait: bool,
    },
    /// Run the jobs of an S3 event notification (`-` reads stdin).
    ProcessEvent {
        #[arg(default_value = "-")]
        input: String,
    },
    /// Read a status record.
    Status {
        key: String,
        /// Poll until the job finishes.
        #[arg(long)]
        wait: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let g = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs for interactive runs.
    let show_progress = !g.quiet && !g.no_progress && !g.log_json;
    let filter = if g.verbose {
        "debug"
    } else if g.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    if g.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .init();
    }

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn JobProgressCallback>)
    } else {
        None
    };

    match &cli.command {
        Command::Convert { input, output, json } => {
            let config = build_config(g, progress).await?;
            let engine = build_engine(g);
            let out = convert_file(input, output, &engine, &config)
                .await
                .context("Conversion failed")?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&out).context("Failed to serialise output")?);
            } else if !g.quiet && !show_progress {
                eprintln!(
                    "{}  {}  {}ms  →  {}",
                    green("✔"),
                    dim(&format!("{} bytes", out.stats.pdf_bytes)),
                    out.stats.total_duration_ms,
                    bold(&out.location),
                );
            }
        }

        Command::Inspect { input, json } => {
            let meta = inspect(input).await.context("Failed to inspect Markdown")?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?);
            } else {
                println!("File:     {}", input.display());
                println!("Title:    {}", meta.title);
                println!("Version:  {}", meta.version);
                println!(
                    "Client:   {}",
                    if meta.client_name.is_empty() { "-" } else { &meta.client_name }
                );
                println!("Date:     {}", meta.date_str);
            }
        }

        Command::Preview { input, output } => {
            let config = build_config(g, None).await?;
            let content = tokio::fs::read_to_string(input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let doc = render_document(&content, &config).context("Rendering failed")?;
            match output {
                Some(path) => {
                    tokio::fs::write(path, &doc.html)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    if !g.quiet {
                        eprintln!("{} {}  {}", green("✔"), bold(&path.display().to_string()), dim(&doc.filename));
                    }
                }
                None => {
                    io::stdout()
                        .lock()
                        .write_all(doc.html.as_bytes())
                        .context("Failed to write to stdout")?;
                }
            }
        }

        Command::Submit {
            input,
            name,
            entity,
            wait,
        } => {
            let config = build_config(g, None).await?;
            let store = FsObjectStore::new(&g.store_dir);
            let content = read_input(input).await?;
            let filename = match name {
                Some(name) => Some(name.clone()),
                None if input.as_str() != "-" => Path::new(input)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(String::from),
                None => None,
            };
            let keys = submit_markdown(&store, &config, entity.as_deref(), filename.as_deref(), &content)
                .await
                .context("Submission failed")?;
            println!("{}", serde_json::to_string_pretty(&keys).context("Failed to serialise keys")?);

            if *wait {
                let record = wait_for_status(&store, &keys.status_key, &config)
                    .await
                    .context("Waiting for status failed")?;
                report_status(&record)?;
            }
        }

        Command::ProcessEvent { input } => {
            let config = build_config(g, progress).await?;
            let payload = read_input(input).await?;
            let ctx = JobContext::new(
                Arc::new(FsObjectStore::new(&g.store_dir)),
                Arc::new(build_engine(g)),
                config,
            );
            let reports = handle_notification(&payload, &ctx)
                .await
                .context("Invalid notification")?;

            let mut failed = 0usize;
            for report in &reports {
                match &report.result {
                    Ok(outcome) => eprintln!("{} {} → {}", green("✔"), report.event.key, outcome.output.location),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{} {}: {}", red("✘"), report.event.key, e);
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} of {} job(s) failed", reports.len());
            }
        }

        Command::Status { key, wait } => {
            let config = build_config(g, None).await?;
            let store = FsObjectStore::new(&g.store_dir);
            let record = if *wait {
                wait_for_status(&store, key, &config)
                    .await
                    .context("Waiting for status failed")?
            } else {
                md2pdf::load_json::<StatusRecord>(&store, key)
                    .await
                    .with_context(|| format!("Failed to read status {key}"))?
            };
            report_status(&record)?;
        }
    }

    Ok(())
}

/// Print a record as JSON and fail the process for an `error` status.
fn report_status(record: &StatusRecord) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(record).context("Failed to serialise status")?);
    if let JobState::Error { ref error } = record.state {
        bail!("Job failed: {error}");
    }
    Ok(())
}

async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read {input}"))
    }
}

fn build_engine(g: &GlobalArgs) -> HttpRenderEngine {
    let engine = HttpRenderEngine::new(&g.engine_url).with_timeout(Duration::from_secs(g.engine_timeout));
    match g.engine_token {
        Some(ref token) => engine.with_token(token),
        None => engine,
    }
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(g: &GlobalArgs, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .max_content_bytes((g.max_size_mib as usize) * 1024 * 1024)
        .concurrency(g.concurrency)
        .poll_interval_ms(g.poll_interval_ms);

    if let Some(ref name) = g.document_name {
        builder = builder.document_name(name);
    }
    if let Some(ref theme) = g.theme {
        builder = builder.highlight_theme(theme);
    }
    if let Some(secs) = g.poll_timeout {
        builder = builder.poll_timeout_secs(secs);
    }
    if let Some(ref path) = g.logo {
        let logo = Logo::from_file(path, "Logo")
            .await
            .with_context(|| format!("Failed to load logo from {}", path.display()))?;
        builder = builder.logo(logo);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
