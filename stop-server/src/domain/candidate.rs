//! Stop candidates: rest facilities and fuel stations near a route.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geo::LatLng;
use super::route::RoutePosition;

/// Tag for expressway service and parking areas.
pub const TAG_SA_PA: &str = "SA/PA";
/// Tag for expressway rest facilities other than SA/PA.
pub const TAG_EXPRESSWAY_REST: &str = "高速休憩所";
/// Tag for roadside stations.
pub const TAG_MICHI_NO_EKI: &str = "道の駅";
/// Tag for fuel stations inside the expressway network.
pub const TAG_HIGHWAY_STATION: &str = "高速道路内SS";
/// Tag for fuel stations on surface roads.
pub const TAG_SURFACE_STATION: &str = "一般道SS";

/// What a candidate is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CandidateKind {
    Rest,
    Fuel,
}

/// Where a candidate record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateSource {
    /// Open geographic database.
    OpenData,
    /// Commercial places API.
    Commercial,
    /// Locally maintained catalog.
    LocalMaster,
}

/// A fuel brand the planner knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FuelBrand {
    Ew,
    Usami,
}

impl FuelBrand {
    /// Wire code of the brand.
    pub fn code(&self) -> &'static str {
        match self {
            FuelBrand::Ew => "EW",
            FuelBrand::Usami => "USAMI",
        }
    }

    /// Search keyword for live place lookups.
    pub fn search_keyword(&self) -> &'static str {
        match self {
            FuelBrand::Ew => "ENEOSウイング",
            FuelBrand::Usami => "宇佐美",
        }
    }

    /// Guess the brand from a station's display name.
    pub fn infer_from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.contains("ウイング") || lower.contains("wing") {
            Some(FuelBrand::Ew)
        } else if lower.contains("宇佐美") || lower.contains("usami") {
            Some(FuelBrand::Usami)
        } else {
            None
        }
    }
}

impl fmt::Display for FuelBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which brands the driver accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BrandPreference {
    Ew,
    Usami,
    Both,
}

impl BrandPreference {
    /// The brands this preference accepts.
    pub fn accepted(&self) -> &'static [FuelBrand] {
        match self {
            BrandPreference::Ew => &[FuelBrand::Ew],
            BrandPreference::Usami => &[FuelBrand::Usami],
            BrandPreference::Both => &[FuelBrand::Ew, FuelBrand::Usami],
        }
    }
}

/// Amenities a facility is known to have. Unknown means absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Equipment {
    pub shower: bool,
    pub open24h: bool,
    pub convenience: bool,
    pub large_parking: bool,
}

/// Facility type flags derived by a source-specific classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FacilityClass {
    pub is_sa_pa: bool,
    pub is_expressway_rest: bool,
    pub is_michi_no_eki: bool,
}

impl FacilityClass {
    /// Expressway facilities count as highway stops.
    pub fn is_highway(&self) -> bool {
        self.is_sa_pa || self.is_expressway_rest
    }

    /// Display tags for the classified types.
    pub fn tags(&self) -> Vec<String> {
        [
            (self.is_sa_pa, TAG_SA_PA),
            (self.is_expressway_rest, TAG_EXPRESSWAY_REST),
            (self.is_michi_no_eki, TAG_MICHI_NO_EKI),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .map(|(_, tag)| tag.to_string())
        .collect()
    }

    /// Recover the class from display tags (used by curated catalogs).
    pub fn from_tags(tags: &[String]) -> Self {
        let has = |tag: &str| tags.iter().any(|t| t == tag);
        Self {
            is_sa_pa: has(TAG_SA_PA),
            is_expressway_rest: has(TAG_EXPRESSWAY_REST),
            is_michi_no_eki: has(TAG_MICHI_NO_EKI),
        }
    }
}

/// A facility positioned relative to the current route.
///
/// The route-relative fields are computed for one route and are not reused
/// for another.
#[derive(Debug, Clone, PartialEq)]
pub struct StopCandidate {
    pub id: String,
    pub kind: CandidateKind,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub source: CandidateSource,
    pub is_highway: bool,
    pub distance_from_route_km: f64,
    pub distance_from_start_km: f64,
    pub eta: DateTime<Utc>,
    pub equipment: Equipment,
    pub tags: Vec<String>,
    pub brand: Option<FuelBrand>,
}

impl StopCandidate {
    /// The candidate's coordinate.
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// The facts about a facility that do not depend on the route.
#[derive(Debug, Clone)]
pub struct Facility {
    pub id: String,
    pub kind: CandidateKind,
    pub name: String,
    pub address: String,
    pub position: LatLng,
    pub source: CandidateSource,
    pub is_highway: bool,
    pub equipment: Equipment,
    pub tags: Vec<String>,
    pub brand: Option<FuelBrand>,
}

impl Facility {
    /// Attach route-relative distance and ETA.
    pub fn place_on_route(self, position: &RoutePosition, depart_at: DateTime<Utc>) -> StopCandidate {
        StopCandidate {
            id: self.id,
            kind: self.kind,
            name: self.name,
            address: self.address,
            lat: self.position.lat,
            lng: self.position.lng,
            source: self.source,
            is_highway: self.is_highway,
            distance_from_route_km: position.distance_from_route_km,
            distance_from_start_km: position.distance_from_start_km,
            eta: position.eta(depart_at),
            equipment: self.equipment,
            tags: self.tags,
            brand: self.brand,
        }
    }
}
