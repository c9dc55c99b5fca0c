//! Caching layer for routing responses.
//!
//! Only the provider's raw answer (polyline and totals) is cached. Route
//! points and every candidate's route-relative fields are still rebuilt for
//! each request from that answer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tracing::trace;

use super::RouteProvider;
use super::error::RoutingError;
use super::types::{RawRoute, RouteQuery};

/// Configuration for the route cache.
#[derive(Debug, Clone)]
pub struct RouteCacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for RouteCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 500,
        }
    }
}

/// Route provider with caching.
///
/// Failures are never cached.
pub struct CachedRouteProvider<P> {
    inner: P,
    routes: MokaCache<RouteQuery, Arc<RawRoute>>,
}

impl<P: RouteProvider> CachedRouteProvider<P> {
    /// Create a new cached provider.
    pub fn new(inner: P, config: &RouteCacheConfig) -> Self {
        let routes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, routes }
    }

    /// Access the wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: RouteProvider> RouteProvider for CachedRouteProvider<P> {
    async fn fetch_route(&self, query: &RouteQuery) -> Result<RawRoute, RoutingError> {
        if let Some(cached) = self.routes.get(query).await {
            trace!(origin = %query.origin, destination = %query.destination, "route cache hit");
            return Ok((*cached).clone());
        }

        let raw = self.inner.fetch_route(query).await?;
        self.routes
            .insert(query.clone(), Arc::new(raw.clone()))
            .await;

        Ok(raw)
    }
}
