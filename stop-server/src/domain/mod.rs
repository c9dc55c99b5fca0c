//! Domain types for the stop planner.
//!
//! Route geometry, candidate facilities and the driver's filters. Nothing
//! in here performs I/O; everything is rebuilt for each planning request.

mod candidate;
mod filter;
mod geo;
mod polyline;
mod route;
mod time;

pub use candidate::{
    BrandPreference, CandidateKind, CandidateSource, Equipment, Facility, FacilityClass,
    FuelBrand, StopCandidate, TAG_EXPRESSWAY_REST, TAG_HIGHWAY_STATION, TAG_MICHI_NO_EKI,
    TAG_SA_PA, TAG_SURFACE_STATION,
};
pub use filter::{EquipmentFilter, FacilityTypeFilter};
pub use geo::{EARTH_RADIUS_KM, LatLng, haversine_km};
pub use polyline::{decode_polyline, encode_polyline};
pub use route::{
    RoutePoint, RoutePosition, RouteSummary, build_route_points, locate_on_route,
};
pub use time::{add_minutes, format_iso, minutes_between, parse_iso};
