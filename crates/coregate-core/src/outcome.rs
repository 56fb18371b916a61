//! Per-request outcome records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One record per forwarded request, appended after the backend
/// responded or the forward failed. Read-only everywhere except the
/// metrics store that retains it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOutcome {
    /// Correlation id, unique per request
    pub correlation_id: String,
    /// HTTP method
    pub method: String,
    /// Request path
    pub path: String,
    /// Name of the selected backend
    pub backend: String,
    /// Full round-trip time in milliseconds
    pub elapsed_ms: u64,
    /// Response status code. 502 when forwarding failed before a
    /// response was received.
    pub status: u16,
    /// Completion timestamp
    pub timestamp: DateTime<Utc>,
}

impl RequestOutcome {
    /// Create an outcome record stamped with the current time.
    #[must_use]
    pub fn new(
        correlation_id: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
        backend: impl Into<String>,
        elapsed_ms: u64,
        status: u16,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            method: method.into(),
            path: path.into(),
            backend: backend.into(),
            elapsed_ms,
            status,
            timestamp: Utc::now(),
        }
    }

    /// Generate a fresh correlation id.
    #[must_use]
    pub fn generate_correlation_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_fields() {
        let outcome = RequestOutcome::new("cid-1", "GET", "/api/v1/x", "core-api-1", 12, 200);
        assert_eq!(outcome.backend, "core-api-1");
        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.elapsed_ms, 12);
    }

    #[test]
    fn test_correlation_ids_unique() {
        let a = RequestOutcome::generate_correlation_id();
        let b = RequestOutcome::generate_correlation_id();
        assert_ne!(a, b);
    }
}
