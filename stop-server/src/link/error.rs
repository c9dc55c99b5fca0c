//! Link resolution error types.

/// Errors from resolving a map-sharing link.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinkError {
    /// Input is not a URL at all
    #[error("invalid map URL: {0}")]
    InvalidUrl(String),

    /// Link (or where it redirects to) is not a known map service
    #[error("not a supported map-sharing link (host: {0})")]
    UnsupportedHost(String),

    /// Network failure while following redirects
    #[error("failed to expand map link: {0}")]
    Http(String),

    /// Expansion exceeded its time budget
    #[error("map link expansion timeout ({timeout_ms}ms)")]
    Timeout { timeout_ms: u64 },

    /// Neither the link nor its embedded coordinates name two places
    #[error(
        "could not extract origin/destination from the map link; add them as extra waypoints and retry"
    )]
    Unextractable,
}
