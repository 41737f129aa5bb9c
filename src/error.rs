//! Crate-wide error taxonomy.
//!
//! One variant per row of the error-kind table: cause, and whether the
//! orchestrator's retry loop is allowed to absorb it before it reaches the
//! caller. Recoverable kinds are consumed internally up to the configured
//! retry budget; only the final failure (or a non-recoverable kind,
//! immediately) is ever surfaced to a caller.

use std::collections::HashMap;

use uuid::Uuid;

/// Fieldless mirror of [`SearchError`] for match-friendly classification
/// (status serialization, retry-budget bucketing) without cloning message
/// strings around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    RateLimited,
    Blocked,
    CaptchaRequired,
    UpstreamTimeout,
    ParseFailure,
    NoProxyAvailable,
    Cancelled,
    Internal,
}

impl ErrorKind {
    /// Whether the orchestrator retry loop may absorb an error of this kind
    /// before surfacing it to the caller.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimited
                | ErrorKind::UpstreamTimeout
                | ErrorKind::ParseFailure
                | ErrorKind::NoProxyAvailable
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Blocked => "blocked",
            ErrorKind::CaptchaRequired => "captcha_required",
            ErrorKind::UpstreamTimeout => "upstream_timeout",
            ErrorKind::ParseFailure => "parse_failure",
            ErrorKind::NoProxyAvailable => "no_proxy_available",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// A redacted snapshot of the query that triggered a surfaced error. PII
/// fields are replaced with a fixed placeholder; only the query `kind` and
/// language survive unredacted since they carry no personal data.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RedactedQuery {
    pub kind: String,
    pub language: String,
    pub fields: HashMap<String, String>,
}

const REDACTED_PLACEHOLDER: &str = "[redacted]";

impl RedactedQuery {
    /// Builds a redacted snapshot from arbitrary named fields; every value is
    /// replaced with the fixed placeholder, only field *names* are kept, so a
    /// future additional identifying field never accidentally leaks through
    /// this path.
    pub fn new(kind: impl Into<String>, language: impl Into<String>, field_names: &[&str]) -> Self {
        let fields = field_names
            .iter()
            .map(|name| (name.to_string(), REDACTED_PLACEHOLDER.to_string()))
            .collect();
        Self {
            kind: kind.into(),
            language: language.into(),
            fields,
        }
    }
}

/// A surfaced, correlatable error. Every error that crosses the orchestrator
/// boundary is one of these, carrying a human-readable message, a
/// correlation handle for cross-referencing diagnostics, and (when a query
/// was in scope) a redacted copy of it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message} (correlation_id={correlation_id})")]
pub struct SearchError {
    pub kind: ErrorKind,
    pub message: String,
    pub correlation_id: Uuid,
    pub redacted_query: Option<RedactedQuery>,
}

impl SearchError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            correlation_id: Uuid::new_v4(),
            redacted_query: None,
        }
    }

    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = id;
        self
    }

    pub fn with_redacted_query(mut self, query: RedactedQuery) -> Self {
        self.redacted_query = Some(query);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    pub fn blocked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Blocked, message)
    }

    pub fn captcha_required(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CaptchaRequired, message)
    }

    pub fn upstream_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamTimeout, message)
    }

    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailure, message)
    }

    pub fn no_proxy_available(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoProxyAvailable, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<std::io::Error> for SearchError {
    fn from(err: std::io::Error) -> Self {
        SearchError::internal(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::parse_failure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds_match_spec_table() {
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(ErrorKind::UpstreamTimeout.is_retryable());
        assert!(ErrorKind::ParseFailure.is_retryable());
        assert!(ErrorKind::NoProxyAvailable.is_retryable());

        assert!(!ErrorKind::Validation.is_retryable());
        assert!(!ErrorKind::Blocked.is_retryable());
        assert!(!ErrorKind::CaptchaRequired.is_retryable());
        assert!(!ErrorKind::Cancelled.is_retryable());
        assert!(!ErrorKind::Internal.is_retryable());
    }

    #[test]
    fn redacted_query_never_carries_values() {
        let q = RedactedQuery::new("by_name", "en", &["first_name", "last_name", "dob"]);
        for v in q.fields.values() {
            assert_eq!(v, REDACTED_PLACEHOLDER);
        }
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let s = serde_json::to_string(&ErrorKind::NoProxyAvailable).unwrap();
        assert_eq!(s, "\"no_proxy_available\"");
    }
}
