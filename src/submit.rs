//! Client side of the upload workflow: submit Markdown, then poll its status.

use crate::config::ConversionConfig;
use crate::error::Md2PdfError;
use crate::keys::{upload_key, JobKeys};
use crate::pipeline::input;
use crate::status::StatusRecord;
use crate::store::{load_json, ObjectStore, CONTENT_TYPE_MARKDOWN};
use chrono::Utc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Validate `content` and upload it, returning the keys the job will use.
///
/// Nothing is written when validation fails. Without a filename the upload
/// is named `document-{unix millis}.md`; `entity` adds a path segment that
/// is mirrored into the status and output keys.
pub async fn submit_markdown(
    store: &dyn ObjectStore,
    config: &ConversionConfig,
    entity: Option<&str>,
    filename: Option<&str>,
    content: &str,
) -> Result<JobKeys, Md2PdfError> {
    input::validate_content(content, config.max_content_bytes)?;
    let filename = input::upload_filename(filename, Utc::now().timestamp_millis())?;
    let key = upload_key(&config.key_layout, entity, &filename)?;
    let keys = JobKeys::from_source_key(&key, &config.key_layout)?;

    store
        .put(&key, content.as_bytes().to_vec(), CONTENT_TYPE_MARKDOWN)
        .await?;
    info!("Uploaded {} ({} bytes)", key, content.len());
    Ok(keys)
}

/// Poll `status_key` every `config.poll_interval_ms` until the job reaches a
/// terminal state.
///
/// A missing or unreadable record counts as "not yet". With
/// `config.poll_timeout_secs` set, gives up with
/// [`Md2PdfError::StatusTimeout`].
pub async fn wait_for_status(
    store: &dyn ObjectStore,
    status_key: &str,
    config: &ConversionConfig,
) -> Result<StatusRecord, Md2PdfError> {
    let interval = Duration::from_millis(config.poll_interval_ms);
    let deadline = config
        .poll_timeout_secs
        .map(|secs| (Instant::now() + Duration::from_secs(secs), secs));

    loop {
        match load_json::<StatusRecord>(store, status_key).await {
            Ok(record) if record.is_terminal() => {
                info!("{} is {}", status_key, record.state.name());
                return Ok(record);
            }
            Ok(record) => debug!("{} still {}", status_key, record.state.name()),
            Err(e) => debug!("{} not readable yet: {}", status_key, e),
        }

        if let Some((at, secs)) = deadline {
            if Instant::now() + interval > at {
                return Err(Md2PdfError::StatusTimeout {
                    key: status_key.to_string(),
                    secs,
                });
            }
        }
        tokio::time::sleep(interval).await;
    }
}
