//! Routing provider.
//!
//! Turns an origin, destination and waypoints into route geometry with
//! total distance and duration. The Directions API is the production
//! implementation; a TTL cache can wrap any provider.

mod cache;
mod client;
mod error;
mod types;

use async_trait::async_trait;

pub use cache::{CachedRouteProvider, RouteCacheConfig};
pub use client::{DirectionsClient, DirectionsConfig};
pub use error::RoutingError;
pub use types::{DirectionsResponse, RawRoute, RouteQuery};

/// Source of driving routes.
///
/// This abstraction allows the planner to be tested with canned routes.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// Fetch a driving route for the query.
    async fn fetch_route(&self, query: &RouteQuery) -> Result<RawRoute, RoutingError>;
}
