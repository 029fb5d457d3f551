// Scrape error taxonomy

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Correlation input that must be non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Jobs,
    Users,
    Groups,
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Input::Jobs => "jobs",
            Input::Users => "users",
            Input::Groups => "groups",
        })
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to acquire {origin}: {reason}")]
    Acquisition { origin: &'static str, reason: String },

    #[error("{origin} did not finish within {after:?}")]
    CommandTimeout {
        origin: &'static str,
        after: Duration,
    },

    #[error("query engine request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed processing query engine JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("retrieved content from {origin} is empty")]
    EmptySource { origin: &'static str },

    #[error("malformed {origin} record ({reason}): {line}")]
    MalformedRecord {
        origin: &'static str,
        line: String,
        reason: String,
    },

    #[error("too few procname_uid fields in series key: {key}")]
    UnparseableKey { key: String },

    #[error("uid is not an integer in series key: {key}")]
    InvalidUid { key: String },

    #[error("uid not found in users map: {0}")]
    UnknownUid(i64),

    #[error("gid not found in groups map: {0}")]
    UnknownGid(u32),

    #[error("correlation input {0} is not set or empty")]
    MissingInput(Input),

    #[error("query engine reported status {0:?}")]
    QueryStatus(String),
}

impl ScrapeError {
    pub(crate) fn malformed(
        origin: &'static str,
        line: &str,
        reason: impl Into<String>,
    ) -> Self {
        ScrapeError::MalformedRecord {
            origin,
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    /// Classification failures are governed by the configured policy.
    pub fn is_classification(&self) -> bool {
        matches!(
            self,
            ScrapeError::UnparseableKey { .. } | ScrapeError::InvalidUid { .. }
        )
    }
}
