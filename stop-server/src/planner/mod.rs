//! Stop planner.
//!
//! This module answers: "Driving this route, where should I take my
//! mandated breaks, and where should I refuel?"
//!
//! Rest candidates come from an ordered cascade of providers; fuel
//! candidates merge the master catalog with a live lookup. Rest windows
//! are then laid over the trip by elapsed drive time.

mod cascade;
mod dedup;
mod error;
mod fuel;
mod plan;
mod schedule;

#[cfg(test)]
pub(crate) mod test_support;

pub use cascade::{CascadeOutcome, RestCascade};
pub use dedup::{CandidateKey, candidate_key, merge_candidates, normalize_name, within_corridor};
pub use error::{FieldError, PlanError, hint_for};
pub use fuel::{
    DEFAULT_FUEL_RANGE_KM, FUEL_CORRIDOR_KM, FuelCollector, FuelOutcome, FuelPreferences,
    fuel_range_km,
};
pub use plan::{ExtractedRouteInput, PlanOutcome, PlanRequest, PlanStatus, Planner};
pub use schedule::{
    BREAK_BAND_MIN, DRIVE_LIMIT_MIN, EXTENDED_DRIVE_LIMIT_MIN, RestStyle, RestWindow,
    build_rest_windows, drive_limit_min,
};
