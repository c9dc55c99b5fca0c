//! Expand shortened map links and turn them into route queries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use super::error::LinkError;
use super::parse::{extract_coordinate_pairs, parse_from_path, parse_from_query};
use crate::routing::RouteQuery;

/// Hosts a map link may start at or redirect to.
pub const ALLOWED_HOSTS: &[&str] = &[
    "maps.app.goo.gl",
    "goo.gl",
    "www.google.com",
    "google.com",
    "maps.google.com",
    "www.google.co.jp",
    "google.co.jp",
    "maps.google.co.jp",
];

/// Maximum redirects followed while expanding.
const MAX_REDIRECTS: usize = 10;

/// Returns true when the URL's host is a known map service.
pub fn is_allowed_host(url: &Url) -> bool {
    url.host_str()
        .map(|host| ALLOWED_HOSTS.contains(&host.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Follows redirects from a sharing link to its canonical URL.
#[async_trait]
pub trait LinkExpander: Send + Sync {
    async fn expand(&self, url: &Url) -> Result<Url, LinkError>;
}

/// Expands links over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLinkExpander {
    http: reqwest::Client,
    timeout_ms: u64,
}

impl HttpLinkExpander {
    /// Build an expander with its own redirect-following client.
    pub fn new(timeout_ms: u64) -> Result<Self, LinkError> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent("Mozilla/5.0 (compatible; stop-server)")
            .build()
            .map_err(|e| LinkError::Http(e.to_string()))?;
        Ok(Self { http, timeout_ms })
    }
}

#[async_trait]
impl LinkExpander for HttpLinkExpander {
    async fn expand(&self, url: &Url) -> Result<Url, LinkError> {
        let request = self.http.get(url.clone()).send();
        let response = tokio::time::timeout(Duration::from_millis(self.timeout_ms), request)
            .await
            .map_err(|_| LinkError::Timeout {
                timeout_ms: self.timeout_ms,
            })?
            .map_err(|e| LinkError::Http(e.to_string()))?;

        if !response.status().is_success() {
            // The final URL still carries the route even on an error page.
            debug!(status = %response.status(), "link expansion ended on non-success status");
        }

        Ok(response.url().clone())
    }
}

/// A link after expansion and extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLink {
    /// Canonical URL after redirects
    pub expanded_url: String,
    /// Route named by the link, when both ends were found
    pub route_input: Option<RouteQuery>,
    /// Waypoints from the link followed by caller-supplied extras
    pub waypoints: Vec<String>,
}

impl ResolvedLink {
    /// Route between the first and last coordinates embedded in the link.
    ///
    /// Lower-confidence substitute for when place names are missing or the
    /// routing provider cannot find them.
    pub fn coordinate_fallback(&self) -> Option<RouteQuery> {
        let pairs = extract_coordinate_pairs(&self.expanded_url);
        match pairs.as_slice() {
            [first, .., last] => Some(RouteQuery::new(
                first.to_query_string(),
                last.to_query_string(),
                self.waypoints.clone(),
            )),
            _ => None,
        }
    }
}

/// Turns a sharing link into a route query.
#[derive(Clone)]
pub struct LinkResolver {
    expander: Arc<dyn LinkExpander>,
}

impl LinkResolver {
    pub fn new(expander: Arc<dyn LinkExpander>) -> Self {
        Self { expander }
    }

    /// Expand the link and extract origin, destination and waypoints.
    ///
    /// Query parameters win over path segments. `extra_waypoints` are
    /// appended after any waypoints found in the link. A missing origin or
    /// destination is not an error here; `route_input` is `None` and the
    /// caller decides whether the coordinate fallback applies.
    pub async fn resolve(
        &self,
        raw: &str,
        extra_waypoints: &[String],
    ) -> Result<ResolvedLink, LinkError> {
        let input = Url::parse(raw.trim()).map_err(|e| LinkError::InvalidUrl(e.to_string()))?;
        check_host(&input)?;

        let expanded = self.expander.expand(&input).await?;
        check_host(&expanded)?;
        debug!(expanded = %expanded, "map link expanded");

        let query = parse_from_query(&expanded);
        let path = parse_from_path(&expanded);

        let origin = query.origin.or(path.origin);
        let destination = query.destination.or(path.destination);
        let mut waypoints = if query.waypoints.is_empty() {
            path.waypoints
        } else {
            query.waypoints
        };
        waypoints.extend(
            extra_waypoints
                .iter()
                .map(|w| w.trim())
                .filter(|w| !w.is_empty())
                .map(str::to_string),
        );

        let route_input = match (origin, destination) {
            (Some(origin), Some(destination)) => {
                Some(RouteQuery::new(origin, destination, waypoints.clone()))
            }
            _ => {
                warn!(expanded = %expanded, "no origin/destination in map link");
                None
            }
        };

        Ok(ResolvedLink {
            expanded_url: expanded.to_string(),
            route_input,
            waypoints,
        })
    }
}

fn check_host(url: &Url) -> Result<(), LinkError> {
    if is_allowed_host(url) {
        Ok(())
    } else {
        Err(LinkError::UnsupportedHost(
            url.host_str().unwrap_or_default().to_string(),
        ))
    }
}
