//! Fuel candidate scoring.
//!
//! Prefers preferred-infrastructure stations placed just short of the
//! driver's usable range over the simply nearest ones.

use crate::domain::StopCandidate;

/// Most fuel candidates returned after ranking.
pub const MAX_FUEL_CANDIDATES: usize = 20;

const HIGHWAY_BONUS: f64 = 1000.0;
const IN_RANGE_BONUS: f64 = 500.0;
const ROUTE_PROXIMITY_MAX: f64 = 200.0;
const ROUTE_PROXIMITY_PER_KM: f64 = 20.0;
const RANGE_FIT_MAX: f64 = 120.0;
const RANGE_FIT_PER_KM: f64 = 1.2;

/// Score one candidate; higher is better.
pub fn fuel_score(candidate: &StopCandidate, range_km: f64, prioritize_highway: bool) -> f64 {
    let highway = if prioritize_highway && candidate.is_highway {
        HIGHWAY_BONUS
    } else {
        0.0
    };
    let in_range = if candidate.distance_from_start_km <= range_km {
        IN_RANGE_BONUS
    } else {
        0.0
    };
    let proximity =
        (ROUTE_PROXIMITY_MAX - candidate.distance_from_route_km * ROUTE_PROXIMITY_PER_KM).max(0.0);
    let range_fit = (RANGE_FIT_MAX
        - (candidate.distance_from_start_km - range_km).abs() * RANGE_FIT_PER_KM)
        .max(0.0);

    highway + in_range + proximity + range_fit
}

/// Order candidates by score, then route offset, then id; keep the top 20.
pub fn rank_fuel_candidates(
    candidates: Vec<StopCandidate>,
    range_km: f64,
    prioritize_highway: bool,
) -> Vec<StopCandidate> {
    let mut scored: Vec<(f64, StopCandidate)> = candidates
        .into_iter()
        .map(|c| (fuel_score(&c, range_km, prioritize_highway), c))
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| {
        sb.total_cmp(sa)
            .then_with(|| a.distance_from_route_km.total_cmp(&b.distance_from_route_km))
            .then_with(|| a.id.cmp(&b.id))
    });

    scored
        .into_iter()
        .take(MAX_FUEL_CANDIDATES)
        .map(|(_, c)| c)
        .collect()
}
