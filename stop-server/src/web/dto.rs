//! Data transfer objects for web requests and responses.
//!
//! Numbers are rounded here and nowhere else: distances to two decimals,
//! durations to one.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{
    BrandPreference, CandidateKind, CandidateSource, Equipment, EquipmentFilter,
    FacilityTypeFilter, FuelBrand, RoutePoint, RouteSummary, StopCandidate, format_iso, parse_iso,
};
use crate::planner::{
    ExtractedRouteInput, FieldError, FuelPreferences, PlanOutcome, PlanRequest, PlanStatus,
    RestStyle, RestWindow, fuel_range_km,
};

/// Presets offered for the usable fuel range, in km.
pub const FUEL_RANGE_PRESETS: [u32; 4] = [50, 100, 150, 200];

/// Request to plan stops along a shared route.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequestDto {
    /// Map-sharing link
    #[serde(default)]
    pub map_url: String,

    /// Departure time, RFC 3339
    #[serde(default)]
    pub depart_at_iso: String,

    #[serde(default)]
    pub extra_waypoints: Vec<String>,

    #[serde(default)]
    pub allow_extended_drive: bool,

    #[serde(default)]
    pub rest_style: RestStyle,

    #[serde(default)]
    pub facility_types: FacilityTypeFilter,

    #[serde(default)]
    pub equipment: EquipmentFilter,

    #[serde(default = "default_fuel_brand")]
    pub fuel_brand: BrandPreference,

    #[serde(default)]
    pub prioritize_highway_stations: bool,

    /// Explicit usable range; wins over the preset
    pub fuel_range_km: Option<f64>,

    pub fuel_range_preset: Option<u32>,

    /// Echo the route geometry and points in the response
    #[serde(default)]
    pub include_route_details: bool,
}

fn default_fuel_brand() -> BrandPreference {
    BrandPreference::Both
}

impl PlanRequestDto {
    /// Check every field and build the planner request.
    ///
    /// All problems are reported together.
    pub fn into_plan_request(self) -> Result<PlanRequest, Vec<FieldError>> {
        let mut errors = Vec::new();

        let map_url = self.map_url.trim();
        if map_url.is_empty() {
            errors.push(FieldError::new("mapUrl", "mapUrl is required"));
        } else if !Url::parse(map_url).is_ok_and(|u| matches!(u.scheme(), "http" | "https")) {
            errors.push(FieldError::new(
                "mapUrl",
                "mapUrl must be an absolute http(s) URL",
            ));
        }

        let depart_at = if self.depart_at_iso.trim().is_empty() {
            errors.push(FieldError::new("departAtIso", "departAtIso is required"));
            None
        } else {
            match parse_iso(&self.depart_at_iso) {
                Ok(t) => Some(t),
                Err(_) => {
                    errors.push(FieldError::new(
                        "departAtIso",
                        "departAtIso must be an ISO-8601 timestamp with offset",
                    ));
                    None
                }
            }
        };

        if let Some(km) = self.fuel_range_km {
            if !km.is_finite() || km <= 0.0 {
                errors.push(FieldError::new(
                    "fuelRangeKm",
                    "fuelRangeKm must be a positive number",
                ));
            }
        }
        if let Some(preset) = self.fuel_range_preset {
            if !FUEL_RANGE_PRESETS.contains(&preset) {
                errors.push(FieldError::new(
                    "fuelRangePreset",
                    "fuelRangePreset must be one of 50, 100, 150, 200",
                ));
            }
        }

        match depart_at {
            Some(depart_at) if errors.is_empty() => Ok(PlanRequest {
                map_url: map_url.to_string(),
                depart_at,
                extra_waypoints: self.extra_waypoints,
                allow_extended_drive: self.allow_extended_drive,
                rest_style: self.rest_style,
                facility_types: self.facility_types,
                equipment: self.equipment,
                fuel: FuelPreferences {
                    brand: self.fuel_brand,
                    range_km: fuel_range_km(self.fuel_range_km, self.fuel_range_preset),
                    prioritize_highway: self.prioritize_highway_stations,
                },
            }),
            _ => Err(errors),
        }
    }
}

/// Plan result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub status: PlanStatus,
    pub warnings: Vec<String>,
    pub extracted_route_input: ExtractedRouteInputDto,
    pub route: RouteDto,
    pub rest_windows: Vec<RestWindowDto>,
    pub fuel_candidates: Vec<CandidateDto>,
}

impl PlanResponse {
    pub fn from_outcome(outcome: PlanOutcome, include_route_details: bool) -> Self {
        Self {
            status: outcome.status,
            warnings: outcome.warnings,
            extracted_route_input: outcome.extracted.into(),
            route: RouteDto::from_summary(outcome.route, include_route_details),
            rest_windows: outcome.rest_windows.iter().map(RestWindowDto::from).collect(),
            fuel_candidates: outcome.fuel_candidates.iter().map(CandidateDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRouteInputDto {
    pub final_expanded_url: String,
    pub origin: String,
    pub destination: String,
    pub waypoints: Vec<String>,
}

impl From<ExtractedRouteInput> for ExtractedRouteInputDto {
    fn from(input: ExtractedRouteInput) -> Self {
        Self {
            final_expanded_url: input.final_expanded_url,
            origin: input.origin,
            destination: input.destination,
            waypoints: input.waypoints,
        }
    }
}

/// Route summary; geometry and points only on request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDto {
    pub origin: String,
    pub destination: String,
    pub waypoints: Vec<String>,
    pub total_distance_km: f64,
    pub total_duration_min: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry_encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<RoutePointDto>>,
}

impl RouteDto {
    pub fn from_summary(route: RouteSummary, include_details: bool) -> Self {
        let (geometry_encoding, points) = if include_details {
            (
                Some(route.geometry),
                Some(route.points.iter().map(RoutePointDto::from).collect()),
            )
        } else {
            (None, None)
        };
        Self {
            origin: route.origin,
            destination: route.destination,
            waypoints: route.waypoints,
            total_distance_km: round2(route.total_distance_km),
            total_duration_min: round1(route.total_duration_min),
            geometry_encoding,
            points,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePointDto {
    pub lat: f64,
    pub lng: f64,
    pub cumulative_distance_km: f64,
    pub cumulative_duration_min: f64,
}

impl From<&RoutePoint> for RoutePointDto {
    fn from(p: &RoutePoint) -> Self {
        Self {
            lat: p.lat,
            lng: p.lng,
            cumulative_distance_km: round2(p.cumulative_distance_km),
            cumulative_duration_min: round1(p.cumulative_duration_min),
        }
    }
}

/// A rest or fuel stop candidate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDto {
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
    pub eta_iso: String,
    pub equipment: Equipment,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<FuelBrand>,
}

impl From<&StopCandidate> for CandidateDto {
    fn from(c: &StopCandidate) -> Self {
        Self {
            id: c.id.clone(),
            kind: c.kind,
            name: c.name.clone(),
            address: c.address.clone(),
            lat: c.lat,
            lng: c.lng,
            source: c.source,
            is_highway: c.is_highway,
            distance_from_route_km: round2(c.distance_from_route_km),
            distance_from_start_km: round2(c.distance_from_start_km),
            eta_iso: format_iso(c.eta),
            equipment: c.equipment,
            tags: c.tags.clone(),
            brand: c.brand,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestWindowDto {
    pub window_id: u32,
    pub target_drive_limit_min: f64,
    pub start_after_min: f64,
    pub end_by_min: f64,
    pub target_break_min: f64,
    pub eta_iso: String,
    pub primary_candidates: Vec<CandidateDto>,
    pub backup_candidates: Vec<CandidateDto>,
}

impl From<&RestWindow> for RestWindowDto {
    fn from(w: &RestWindow) -> Self {
        Self {
            window_id: w.window_id,
            target_drive_limit_min: round1(w.target_drive_limit_min),
            start_after_min: round1(w.start_after_min),
            end_by_min: round1(w.end_by_min),
            target_break_min: round1(w.target_break_min),
            eta_iso: format_iso(w.eta),
            primary_candidates: w.primary_candidates.iter().map(CandidateDto::from).collect(),
            backup_candidates: w.backup_candidates.iter().map(CandidateDto::from).collect(),
        }
    }
}

/// Error body. `fields` for validation failures, `hint` for the rest.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::DEFAULT_FUEL_RANGE_KM;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn parse(body: serde_json::Value) -> PlanRequestDto {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn minimal_request_uses_defaults() {
        let req = parse(json!({
            "mapUrl": "https://maps.app.goo.gl/abc",
            "departAtIso": "2024-05-01T09:00:00+09:00"
        }))
        .into_plan_request()
        .unwrap();

        assert_eq!(req.depart_at, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        assert_eq!(req.rest_style, RestStyle::Single30);
        assert_eq!(req.fuel.brand, BrandPreference::Both);
        assert_eq!(req.fuel.range_km, DEFAULT_FUEL_RANGE_KM);
        assert!(!req.facility_types.is_active());
    }

    #[test]
    fn full_request() {
        let req = parse(json!({
            "mapUrl": "https://maps.app.goo.gl/abc",
            "departAtIso": "2024-05-01T00:00:00Z",
            "extraWaypoints": ["浜松SA"],
            "allowExtendedDrive": true,
            "restStyle": "MULTI_10",
            "facilityTypes": {"saPa": true},
            "equipment": {"shower": true, "largeParking": true},
            "fuelBrand": "USAMI",
            "prioritizeHighwayStations": true,
            "fuelRangePreset": 150
        }))
        .into_plan_request()
        .unwrap();

        assert!(req.allow_extended_drive);
        assert_eq!(req.rest_style, RestStyle::Multi10);
        assert!(req.facility_types.sa_pa && !req.facility_types.michi_no_eki);
        assert!(req.equipment.shower && req.equipment.large_parking && !req.equipment.open24h);
        assert_eq!(req.fuel.brand, BrandPreference::Usami);
        assert_eq!(req.fuel.range_km, 150.0);
        assert!(req.fuel.prioritize_highway);
    }

    #[test]
    fn every_field_error_is_reported() {
        let errors = parse(json!({
            "mapUrl": "maps.app.goo.gl/abc",
            "departAtIso": "tomorrow",
            "fuelRangeKm": -5,
            "fuelRangePreset": 75
        }))
        .into_plan_request()
        .unwrap_err();

        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["mapUrl", "departAtIso", "fuelRangeKm", "fuelRangePreset"]
        );
    }

    #[test]
    fn missing_required_fields() {
        let errors = parse(json!({})).into_plan_request().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "mapUrl is required");
    }

    #[test]
    fn non_http_scheme_rejected() {
        let errors = parse(json!({
            "mapUrl": "ftp://maps.app.goo.gl/abc",
            "departAtIso": "2024-05-01T00:00:00Z"
        }))
        .into_plan_request()
        .unwrap_err();
        assert_eq!(errors[0].field, "mapUrl");
    }

    #[test]
    fn unknown_enum_is_a_parse_error() {
        let result: Result<PlanRequestDto, _> =
            serde_json::from_value(json!({"restStyle": "NAP_5"}));
        assert!(result.is_err());
    }

    #[test]
    fn route_details_only_on_request() {
        let route = RouteSummary::new("a", "b", vec![], "_p~iF~ps|U_ulLnnqC", 12.3456, 78.96);

        let json = serde_json::to_value(RouteDto::from_summary(route.clone(), false)).unwrap();
        assert_eq!(json["totalDistanceKm"], 12.35);
        assert_eq!(json["totalDurationMin"], 79.0);
        assert!(json.get("geometryEncoding").is_none());
        assert!(json.get("points").is_none());

        let json = serde_json::to_value(RouteDto::from_summary(route, true)).unwrap();
        assert_eq!(json["geometryEncoding"], "_p~iF~ps|U_ulLnnqC");
        assert_eq!(json["points"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn candidate_wire_shape() {
        let c = StopCandidate {
            id: "ew-1".into(),
            kind: CandidateKind::Fuel,
            name: "ENEOSウイング 環七".into(),
            address: "東京都".into(),
            lat: 35.7,
            lng: 139.8,
            source: CandidateSource::LocalMaster,
            is_highway: false,
            distance_from_route_km: 1.23456,
            distance_from_start_km: 98.766,
            eta: Utc.with_ymd_and_hms(2024, 5, 1, 2, 30, 0).unwrap(),
            equipment: Equipment::default(),
            tags: vec!["一般道SS".into()],
            brand: Some(FuelBrand::Ew),
        };

        let json = serde_json::to_value(CandidateDto::from(&c)).unwrap();
        assert_eq!(json["kind"], "FUEL");
        assert_eq!(json["source"], "LOCAL_MASTER");
        assert_eq!(json["distanceFromRouteKm"], 1.23);
        assert_eq!(json["distanceFromStartKm"], 98.77);
        assert_eq!(json["etaIso"], "2024-05-01T02:30:00.000Z");
        assert_eq!(json["brand"], "EW");
        assert_eq!(json["equipment"]["largeParking"], false);
    }
}
