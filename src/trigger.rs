//! Upload notifications: decode S3 event JSON into [`UploadEvent`]s.
//!
//! Object keys in S3 notifications are URL-encoded with `+` for spaces.
//! Only `ObjectCreated*` records for `.md` keys under the uploads prefix
//! start a job; anything else is skipped with a warning so that a
//! mis-scoped bucket rule cannot fail a whole batch.

use crate::config::KeyLayout;
use crate::error::Md2PdfError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single uploaded object that should be converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadEvent {
    pub bucket: String,
    pub key: String,
}

impl UploadEvent {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "Records", default)]
    records: Vec<NotificationRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationRecord {
    #[serde(default)]
    event_name: String,
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
}

/// Decode an S3 notification and keep the records that should start a job.
///
/// Malformed JSON is an error; individual records that do not qualify are
/// dropped.
pub fn parse_notification(payload: &str, layout: &KeyLayout) -> Result<Vec<UploadEvent>, Md2PdfError> {
    let notification: Notification =
        serde_json::from_str(payload).map_err(|e| Md2PdfError::InvalidEvent(e.to_string()))?;

    let events = notification
        .records
        .into_iter()
        .filter_map(|record| accept_record(record, layout))
        .collect();
    Ok(events)
}

fn accept_record(record: NotificationRecord, layout: &KeyLayout) -> Option<UploadEvent> {
    if !record.event_name.starts_with("ObjectCreated") {
        warn!(
            "Skipping '{}' event for {}",
            record.event_name, record.s3.object.key
        );
        return None;
    }
    let key = match decode_key(&record.s3.object.key) {
        Some(key) => key,
        None => {
            warn!("Skipping undecodable key {}", record.s3.object.key);
            return None;
        }
    };
    if !key.starts_with(layout.uploads.as_str()) || !key.ends_with(".md") {
        warn!("Skipping {}: not a Markdown upload", key);
        return None;
    }
    Some(UploadEvent {
        bucket: record.s3.bucket.name,
        key,
    })
}

/// S3 keys arrive form-encoded: `+` is a space, `%XX` an escaped byte.
pub fn decode_key(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|k| k.into_owned())
}
