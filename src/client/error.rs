//! Error types for the gateway client.
//!
//! Every failure a gateway call can produce maps to exactly one variant, so
//! callers can branch on "the gateway said no" (status variants) versus
//! "we never got an answer" (transport variants).

use std::path::PathBuf;

use thiserror::Error;

const TOKEN_SUGGESTION: &str = "Check your API token and its permissions.";
const INSECURE_TOKEN_SUGGESTION: &str = "The gateway may require secure connections for API tokens; \
     use an https:// URL or relax 'Require secure connections' in the gateway security settings.";

/// Errors that can occur while talking to the gateway REST API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Connection could not be established (DNS, refused, TLS handshake).
    #[error("cannot connect to gateway at {url}: {source}")]
    Connection {
        /// Gateway URL that was being contacted.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// Gateway URL that timed out.
        url: String,
    },

    /// The response body stream broke off mid-transfer.
    #[error("transfer from {url} interrupted: {source}")]
    Transfer {
        /// Request URL.
        url: String,
        /// The underlying stream error.
        #[source]
        source: reqwest::Error,
    },

    /// The configured gateway URL (or a derived request URL) is malformed.
    #[error("invalid gateway URL: {url}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
    },

    /// HTTP 401 or 403.
    #[error("authentication failed (HTTP {status}): {detail}\n  Suggestion: {suggestion}")]
    Authentication {
        /// 401 or 403.
        status: u16,
        /// Gateway-supplied detail message.
        detail: String,
        /// User-facing hint.
        suggestion: String,
    },

    /// HTTP 404.
    #[error("not found: {detail}")]
    NotFound {
        /// Gateway-supplied detail message.
        detail: String,
    },

    /// HTTP 409.
    #[error("conflict: {detail}")]
    Conflict {
        /// Gateway-supplied detail message.
        detail: String,
    },

    /// HTTP 400 or 422.
    #[error("validation failed (HTTP {status}): {detail}")]
    Validation {
        /// 400 or 422.
        status: u16,
        /// Gateway-supplied detail message.
        detail: String,
    },

    /// Any other non-success status.
    #[error("gateway returned {status}: {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Gateway-supplied detail message.
        detail: String,
    },

    /// Local file system error while streaming to or from disk.
    #[error("IO error at {path}: {source}")]
    Io {
        /// File path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A streamed download produced zero bytes.
    #[error("empty response from gateway; nothing written to {path}")]
    EmptyResponse {
        /// Intended destination.
        path: PathBuf,
    },

    /// A success response carried a body that is not valid JSON.
    #[error("invalid JSON in response from {url}: {source}")]
    Decode {
        /// Request URL.
        url: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client could not be constructed (TLS backend, headers).
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl GatewayError {
    /// Creates a connection error.
    pub fn connection(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Connection {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an interrupted-transfer error.
    pub fn transfer(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transfer {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Maps a non-success HTTP status and its body to a typed error.
    ///
    /// `gateway_url` is only consulted for the plain-http authentication hint.
    #[must_use]
    pub fn from_status(status: u16, body: &str, gateway_url: &str) -> Self {
        let detail = extract_detail(status, body);
        match status {
            401 | 403 => {
                let suggestion = if gateway_url.starts_with("http://") {
                    format!("{TOKEN_SUGGESTION} {INSECURE_TOKEN_SUGGESTION}")
                } else {
                    TOKEN_SUGGESTION.to_string()
                };
                Self::Authentication {
                    status,
                    detail,
                    suggestion,
                }
            }
            404 => Self::NotFound { detail },
            409 => Self::Conflict { detail },
            400 | 422 => Self::Validation { status, detail },
            _ => Self::Api { status, detail },
        }
    }

    /// Returns true for failures where no HTTP response was received.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::Timeout { .. }
                | Self::Transfer { .. }
                | Self::InvalidUrl { .. }
        )
    }
}

/// Pulls a human-readable message out of an error body.
///
/// Prefers a JSON `message` field, falls back to the trimmed body text, and
/// finally to the canonical reason phrase when the body is empty.
fn extract_detail(status: u16, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(serde_json::Value::String(message)) = map.get("message")
    {
        return message.clone();
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("no detail")
        .to_string()
}
