//! Job status state machine and its persisted record.
//!
//! ```text
//!                  ┌──▶ Complete { pdf_key }
//! Processing ──────┤
//!                  └──▶ Error { error }
//! ```
//!
//! `Processing` is the only entry state and may be overwritten by either
//! terminal state; terminal states are never left. Because the output key
//! and the error message live inside their variants, a record can never
//! claim `complete` without a `pdfKey` or carry an `error` while processing.
//!
//! On the wire a record is a flat JSON object:
//!
//! ```json
//! {"status": "complete", "pdfKey": "generated/report/x.pdf", "updatedAt": "2025-12-15T03:04:05Z"}
//! ```

use crate::error::Md2PdfError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobState {
    Processing,
    Complete {
        #[serde(rename = "pdfKey")]
        pdf_key: String,
    },
    Error {
        error: String,
    },
}

impl JobState {
    /// The entry state.
    pub fn begin() -> Self {
        JobState::Processing
    }

    /// `Processing → Complete`.
    pub fn complete(self, pdf_key: impl Into<String>) -> Result<Self, Md2PdfError> {
        match self {
            JobState::Processing => Ok(JobState::Complete {
                pdf_key: pdf_key.into(),
            }),
            terminal => Err(terminal.illegal("complete")),
        }
    }

    /// `Processing → Error`.
    pub fn fail(self, error: impl Into<String>) -> Result<Self, Md2PdfError> {
        match self {
            JobState::Processing => Ok(JobState::Error { error: error.into() }),
            terminal => Err(terminal.illegal("error")),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Processing)
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobState::Processing => "processing",
            JobState::Complete { .. } => "complete",
            JobState::Error { .. } => "error",
        }
    }

    fn illegal(&self, to: &str) -> Md2PdfError {
        Md2PdfError::IllegalTransition {
            from: self.name().to_string(),
            to: to.to_string(),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Processing => f.write_str("processing"),
            JobState::Complete { pdf_key } => write!(f, "complete ({pdf_key})"),
            JobState::Error { error } => write!(f, "error: {error}"),
        }
    }
}

/// One complete status snapshot, written whole on every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(flatten)]
    pub state: JobState,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl StatusRecord {
    /// Stamp `state` with the current time.
    pub fn now(state: JobState) -> Self {
        Self {
            state,
            updated_at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn processing_to_complete() {
        let s = JobState::begin().complete("generated/a/x.pdf").unwrap();
        assert_eq!(
            s,
            JobState::Complete {
                pdf_key: "generated/a/x.pdf".into()
            }
        );
        assert!(s.is_terminal());
    }

    #[test]
    fn processing_to_error() {
        let s = JobState::begin().fail("engine down").unwrap();
        assert_eq!(s.name(), "error");
    }

    #[test]
    fn terminal_states_cannot_transition() {
        let done = JobState::begin().complete("k").unwrap();
        let err = done.clone().fail("late").unwrap_err();
        assert!(matches!(err, Md2PdfError::IllegalTransition { ref from, ref to } if from == "complete" && to == "error"));
        assert!(done.complete("again").is_err());

        let failed = JobState::begin().fail("x").unwrap();
        assert!(failed.complete("k").is_err());
    }

    #[test]
    fn complete_record_wire_format() {
        let record = StatusRecord {
            state: JobState::Complete {
                pdf_key: "generated/r/x.pdf".into(),
            },
            updated_at: "2025-12-15T03:04:05Z".parse().unwrap(),
        };
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(
            v,
            json!({"status": "complete", "pdfKey": "generated/r/x.pdf", "updatedAt": "2025-12-15T03:04:05Z"})
        );
    }

    #[test]
    fn processing_record_has_no_optional_fields() {
        let v = serde_json::to_value(StatusRecord::now(JobState::begin())).unwrap();
        assert_eq!(v["status"], "processing");
        assert!(v.get("pdfKey").is_none());
        assert!(v.get("error").is_none());
        assert!(v.get("updatedAt").is_some());
    }

    #[test]
    fn error_record_round_trips() {
        let raw = r#"{"status":"error","error":"Content too large","updatedAt":"2025-01-01T00:00:00Z"}"#;
        let record: StatusRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(
            record.state,
            JobState::Error {
                error: "Content too large".into()
            }
        );
        assert!(record.is_terminal());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let raw = r#"{"status":"queued","updatedAt":"2025-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<StatusRecord>(raw).is_err());
    }
}
