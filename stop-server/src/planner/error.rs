//! Plan-level error taxonomy.

use serde::Serialize;

use crate::link::LinkError;
use crate::routing::RoutingError;

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Why a plan could not be produced.
///
/// Provider failures never reach here; they become warnings.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlanError {
    /// Request is malformed
    #[error("invalid request")]
    Validation(Vec<FieldError>),

    /// Link host rejected, or no route could be extracted from it
    #[error(transparent)]
    LinkResolution(#[from] LinkError),

    /// The route lookup ran out of time
    #[error("{0}")]
    UpstreamTimeout(String),

    /// The route lookup failed
    #[error("{0}")]
    UpstreamFailure(String),

    /// A required credential or store is missing
    #[error("{0}")]
    Configuration(String),
}

impl From<RoutingError> for PlanError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::MissingApiKey => PlanError::Configuration(err.to_string()),
            RoutingError::Timeout { .. } => PlanError::UpstreamTimeout(err.to_string()),
            other => PlanError::UpstreamFailure(other.to_string()),
        }
    }
}

/// Pick an actionable hint for an error message.
pub fn hint_for(message: &str) -> &'static str {
    if message.contains("GOOGLE_MAPS_API_KEY") {
        "Set GOOGLE_MAPS_API_KEY in the server environment."
    } else if message.contains("REQUEST_DENIED") || message.to_lowercase().contains("expired") {
        "The Maps API key was rejected or has expired; check the key and its enabled APIs."
    } else if message.contains("NOT_FOUND") || message.contains("ZERO_RESULTS") {
        "No route was found for the places in the link; add explicit waypoints and retry."
    } else if message.contains("fuel station store") {
        "The fuel station store is misconfigured; check FUEL_STORE_PATH."
    } else {
        "Check the map link, add explicit waypoints and retry."
    }
}
