//! Candidate provider error types.

/// Errors from a rest or fuel candidate source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Network failure
    #[error("{label} request failed: {message}")]
    Http { label: String, message: String },

    /// Request exceeded its time budget
    #[error("{label} timeout ({timeout_ms}ms)")]
    Timeout { label: String, timeout_ms: u64 },

    /// Non-success HTTP status
    #[error("{label} returned HTTP {status}")]
    Api { label: String, status: u16 },

    /// Service answered with an error status in its body
    #[error("{label} status {status}")]
    Status { label: String, status: String },

    /// Response body was not the expected JSON
    #[error("{label} returned invalid JSON: {message}")]
    Json { label: String, message: String },

    /// Local file could not be read
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// Every configured endpoint failed; carries the last failure
    #[error("all endpoints failed: {last}")]
    AllEndpointsFailed { last: String },
}

impl ProviderError {
    pub fn http(label: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ProviderError::Http {
            label: label.into(),
            message: err.to_string(),
        }
    }

    pub fn timeout(label: impl Into<String>, timeout_ms: u64) -> Self {
        ProviderError::Timeout {
            label: label.into(),
            timeout_ms,
        }
    }

    /// Returns true if this failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProviderError::timeout("Places NearbySearch", 4500);
        assert_eq!(err.to_string(), "Places NearbySearch timeout (4500ms)");
        assert!(err.is_timeout());

        let err = ProviderError::Api {
            label: "Overpass (https://overpass-api.de/api/interpreter)".into(),
            status: 504,
        };
        assert_eq!(
            err.to_string(),
            "Overpass (https://overpass-api.de/api/interpreter) returned HTTP 504"
        );
        assert!(!err.is_timeout());
    }
}
