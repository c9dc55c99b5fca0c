//! Routing provider error types.

/// Errors from the directions provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RoutingError {
    /// No API key configured
    #[error("GOOGLE_MAPS_API_KEY is not set")]
    MissingApiKey,

    /// Network failure
    #[error("directions request failed: {0}")]
    Http(String),

    /// Request exceeded its time budget
    #[error("directions request timeout ({timeout_ms}ms)")]
    Timeout { timeout_ms: u64 },

    /// Non-success HTTP status
    #[error("directions API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Provider answered but reported a non-OK status (NOT_FOUND, ZERO_RESULTS, ...)
    #[error("route lookup failed: {status}{}", .message.as_deref().map(|m| format!(" ({m})")).unwrap_or_default())]
    Status {
        status: String,
        message: Option<String>,
    },

    /// Response body was not the expected JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}

impl RoutingError {
    /// Returns true when the provider could not find a route for the places given.
    ///
    /// These are the failures the coordinate fallback can recover from.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RoutingError::Status { status, .. } if status == "NOT_FOUND" || status == "ZERO_RESULTS")
    }
}

impl From<reqwest::Error> for RoutingError {
    fn from(err: reqwest::Error) -> Self {
        RoutingError::Http(err.to_string())
    }
}
