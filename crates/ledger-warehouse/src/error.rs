//! Error types for warehouse loads.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use ledger_common::Retryable;
use thiserror::Error;

/// Job and API error reasons that the warehouse documents as transient.
const RETRYABLE_REASONS: &[&str] = &[
    "backendError",
    "internalError",
    "rateLimitExceeded",
    "jobBackendError",
];

/// Errors that can occur while appending a batch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// Connection, DNS, TLS or request timeout failure.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP response.
    #[error("warehouse API returned HTTP {status}: {message}")]
    Http {
        status: u16,
        reason: Option<String>,
        message: String,
    },

    /// The load job finished with an error result.
    #[error("load job {job_id} failed ({reason}): {message}")]
    JobFailed {
        job_id: String,
        reason: String,
        message: String,
    },

    /// The job did not reach `DONE` in time. It may still commit later.
    #[error("load job {job_id} still running after {waited:?}")]
    JobTimeout { job_id: String, waited: Duration },

    /// The job was inserted but its status could not be read back.
    /// Inserting again could append the batch twice.
    #[error("cannot confirm load job {job_id}: {message}")]
    JobUnconfirmed { job_id: String, message: String },

    /// Response body did not have the expected shape.
    #[error("invalid warehouse response: {0}")]
    InvalidResponse(String),

    /// Credentials could not be read or exchanged for a token.
    #[error("credential error: {0}")]
    Credentials(String),

    /// Credentials file of a type this client cannot use.
    #[error("unsupported credentials type '{kind}'; provide an access token instead")]
    UnsupportedCredentials { kind: String },

    /// Batch could not be encoded.
    #[error("failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),

    /// Local file output failed before anything was written.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A write started and failed. Part of the batch may be on disk.
    #[error("write to {path} may be incomplete: {source}")]
    WriteIncomplete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    /// Builds an HTTP error from a status and the raw response body.
    ///
    /// Google APIs wrap failures as `{"error": {"message", "errors": [{"reason"}]}}`;
    /// anything else is kept verbatim.
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct Envelope {
            error: ApiError,
        }
        #[derive(serde::Deserialize)]
        struct ApiError {
            #[serde(default)]
            message: String,
            #[serde(default)]
            errors: Vec<ApiErrorItem>,
        }
        #[derive(serde::Deserialize)]
        struct ApiErrorItem {
            reason: Option<String>,
        }

        match serde_json::from_str::<Envelope>(body) {
            Ok(envelope) => Self::Http {
                status,
                reason: envelope.error.errors.into_iter().find_map(|e| e.reason),
                message: envelope.error.message,
            },
            Err(_) => Self::Http {
                status,
                reason: None,
                message: body.trim().to_string(),
            },
        }
    }
}

fn is_retryable_reason(reason: &str) -> bool {
    RETRYABLE_REASONS.contains(&reason)
}

impl Retryable for LoadError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, reason, .. } => {
                matches!(*status, 408 | 429 | 500..=599)
                    || reason.as_deref().is_some_and(is_retryable_reason)
            }
            Self::JobFailed { reason, .. } => is_retryable_reason(reason),
            Self::Io { source, .. } => matches!(
                source.kind(),
                ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock
            ),
            Self::JobTimeout { .. }
            | Self::JobUnconfirmed { .. }
            | Self::WriteIncomplete { .. }
            | Self::InvalidResponse(_)
            | Self::Credentials(_)
            | Self::UnsupportedCredentials { .. }
            | Self::Encode(_) => false,
        }
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
                reason: None,
                message: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type alias for load operations.
pub type Result<T> = std::result::Result<T, LoadError>;
