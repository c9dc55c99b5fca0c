//! Ordered fallback over rest-facility providers.

use std::sync::Arc;

use tracing::{info, warn};

use super::dedup::{merge_candidates, within_corridor};
use crate::domain::StopCandidate;
use crate::providers::{ProviderContext, RestProvider, sort_by_distance_from_start};

/// Rest candidates and the warnings produced while finding them.
#[derive(Debug, Clone, Default)]
pub struct CascadeOutcome {
    pub candidates: Vec<StopCandidate>,
    pub warnings: Vec<String>,
}

/// Tries each provider in order until one yields candidates on the route.
///
/// A provider that fails or yields nothing inside its corridor hands over
/// to the next one. Failures become warnings, never errors.
#[derive(Clone)]
pub struct RestCascade {
    providers: Vec<Arc<dyn RestProvider>>,
}

impl RestCascade {
    pub fn new(providers: Vec<Arc<dyn RestProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn run(&self, ctx: &ProviderContext<'_>) -> CascadeOutcome {
        let mut warnings = Vec::new();
        let mut passed_over: Vec<&str> = Vec::new();

        for provider in &self.providers {
            let name = provider.name();
            let fetched = match provider.fetch_candidates(ctx).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(provider = name, error = %e, "rest provider failed");
                    warnings.push(format!("{name} failed: {e}"));
                    passed_over.push(name);
                    continue;
                }
            };

            let fetched_count = fetched.len();
            let mut candidates = within_corridor(merge_candidates(fetched), provider.corridor_km());
            if candidates.is_empty() {
                info!(
                    provider = name,
                    fetched = fetched_count,
                    "rest provider had no candidates on the route"
                );
                passed_over.push(name);
                continue;
            }

            if !passed_over.is_empty() {
                info!(provider = name, replaced = ?passed_over, "rest provider substituted");
                warnings.push(format!(
                    "rest stops came from {name} because {} returned nothing usable",
                    passed_over.join(", ")
                ));
            }

            sort_by_distance_from_start(&mut candidates);
            return CascadeOutcome {
                candidates,
                warnings,
            };
        }

        CascadeOutcome {
            candidates: Vec::new(),
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EquipmentFilter, FacilityTypeFilter};
    use crate::planner::test_support::{MockRestProvider, candidate, cascade_of, depart, straight_route};
    use crate::providers::ProviderError;

    fn ctx(route: &crate::domain::RouteSummary) -> ProviderContext<'_> {
        ProviderContext {
            route,
            depart_at: depart(),
            facility_types: FacilityTypeFilter::default(),
            equipment: EquipmentFilter::default(),
        }
    }

    fn three() -> Vec<StopCandidate> {
        (0..3)
            .map(|i| {
                let mut c = candidate(&format!("p{i}"), &format!("PA {i}"), 35.0, 139.0 + i as f64);
                c.distance_from_start_km = 30.0 - i as f64;
                c
            })
            .collect()
    }

    #[tokio::test]
    async fn empty_primary_falls_through_to_places() {
        let route = straight_route();
        let osm = MockRestProvider::returning("open data", vec![]);
        let places = MockRestProvider::returning("places", three());
        let seed = MockRestProvider::returning("seed", three());
        let cascade = cascade_of(&[&osm, &places, &seed]);

        let outcome = cascade.run(&ctx(&route)).await;

        let ids: Vec<_> = outcome.candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p1", "p0"]);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("places"));
        assert!(outcome.warnings[0].contains("open data"));
        assert_eq!(seed.calls(), 0);
    }

    #[tokio::test]
    async fn first_non_empty_provider_wins_without_warning() {
        let route = straight_route();
        let osm = MockRestProvider::returning("open data", three());
        let places = MockRestProvider::returning("places", three());
        let cascade = cascade_of(&[&osm, &places]);

        let outcome = cascade.run(&ctx(&route)).await;
        assert_eq!(outcome.candidates.len(), 3);
        assert!(outcome.warnings.is_empty());
        assert_eq!(places.calls(), 0);
    }

    #[tokio::test]
    async fn failures_become_warnings() {
        let route = straight_route();
        let osm = MockRestProvider::failing(
            "open data",
            ProviderError::AllEndpointsFailed {
                last: "Overpass timeout (8000ms)".into(),
            },
        );
        let places = MockRestProvider::failing("places", ProviderError::timeout("Places nearby", 4500));
        let seed = MockRestProvider::returning("seed", three());
        let cascade = cascade_of(&[&osm, &places, &seed]);

        let outcome = cascade.run(&ctx(&route)).await;
        assert_eq!(outcome.candidates.len(), 3);
        assert_eq!(outcome.warnings.len(), 3);
        assert!(outcome.warnings[0].starts_with("open data failed"));
        assert!(outcome.warnings[1].contains("4500ms"));
        assert!(outcome.warnings[2].contains("seed"));
    }

    #[tokio::test]
    async fn candidates_outside_corridor_count_as_empty() {
        let route = straight_route();
        let mut far = candidate("far", "遠いPA", 36.0, 140.0);
        far.distance_from_route_km = 50.0;
        let osm = MockRestProvider::returning("open data", vec![far]);
        let seed = MockRestProvider::returning("seed", three());
        let cascade = cascade_of(&[&osm, &seed]);

        let outcome = cascade.run(&ctx(&route)).await;
        assert!(outcome.candidates.iter().all(|c| c.id != "far"));
        assert_eq!(outcome.candidates.len(), 3);
    }

    #[tokio::test]
    async fn all_empty_is_not_an_error() {
        let route = straight_route();
        let cascade = cascade_of(&[
            &MockRestProvider::returning("open data", vec![]),
            &MockRestProvider::returning("seed", vec![]),
        ]);
        let outcome = cascade.run(&ctx(&route)).await;
        assert!(outcome.candidates.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn duplicates_within_a_provider_are_merged() {
        let route = straight_route();
        let a = candidate("a", "足柄SA", 35.3, 138.9);
        let b = candidate("b", "足柄sa", 35.3, 138.9);
        let cascade = cascade_of(&[&MockRestProvider::returning("open data", vec![a, b])]);
        let outcome = cascade.run(&ctx(&route)).await;
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].id, "a");
    }
}
