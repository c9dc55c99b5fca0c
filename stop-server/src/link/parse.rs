//! Extract places from an expanded map URL.
//!
//! Map links carry their route in one of two ways: query parameters
//! (`?origin=..&destination=..`) or path segments after a `dir` marker
//! (`/maps/dir/Tokyo/Nagoya/Osaka/@35.1,137.2,8z/data=...`). Failing both,
//! the link's data blob usually still embeds raw coordinates.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;
use url::form_urlencoded;

use crate::domain::LatLng;

/// Path segment that introduces a directions route.
const ROUTE_MARKER: &str = "dir";

const ORIGIN_KEYS: &[&str] = &["origin", "saddr", "source"];
const DESTINATION_KEYS: &[&str] = &["destination", "daddr", "dest"];

/// `!1d<lng>!2d<lat>` pairs inside the data blob, escaped or not.
static COORDINATE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:!|%21)1d(-?\d+(?:\.\d+)?)(?:!|%21)2d(-?\d+(?:\.\d+)?)")
        .expect("coordinate pair pattern is valid")
});

/// Places found in one part of a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPlaces {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub waypoints: Vec<String>,
}

/// Read origin, destination and waypoints from query parameters.
///
/// Several aliases are recognized for origin and destination; waypoints are
/// `|`-separated.
pub fn parse_from_query(url: &Url) -> ExtractedPlaces {
    let find = |keys: &[&str]| {
        keys.iter().find_map(|key| {
            url.query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
    };

    let waypoints = url
        .query_pairs()
        .find(|(k, _)| k == "waypoints")
        .map(|(_, v)| split_waypoints(&v))
        .unwrap_or_default();

    ExtractedPlaces {
        origin: find(ORIGIN_KEYS),
        destination: find(DESTINATION_KEYS),
        waypoints,
    }
}

/// Read places from path segments following the route marker.
///
/// Stops at the first segment that carries map view state rather than a
/// place. Needs at least two places to yield anything.
pub fn parse_from_path(url: &Url) -> ExtractedPlaces {
    let Some(segments) = url.path_segments() else {
        return ExtractedPlaces::default();
    };

    let places: Vec<String> = segments
        .skip_while(|seg| *seg != ROUTE_MARKER)
        .skip(1)
        .take_while(|seg| !is_view_state_segment(seg))
        .map(decode_segment)
        .filter(|seg| !seg.is_empty())
        .collect();

    match places.as_slice() {
        [origin, middle @ .., destination] => ExtractedPlaces {
            origin: Some(origin.clone()),
            destination: Some(destination.clone()),
            waypoints: middle.to_vec(),
        },
        _ => ExtractedPlaces::default(),
    }
}

/// Returns true for segments describing the camera or internal state.
pub fn is_view_state_segment(segment: &str) -> bool {
    segment.starts_with('@')
        || segment.starts_with("data=")
        || segment.starts_with("am=")
        || segment.starts_with("entry=")
}

/// Raw coordinate pairs embedded in the URL, in order of appearance.
pub fn extract_coordinate_pairs(expanded_url: &str) -> Vec<LatLng> {
    COORDINATE_PAIR
        .captures_iter(expanded_url)
        .filter_map(|caps| {
            let lng: f64 = caps.get(1)?.as_str().parse().ok()?;
            let lat: f64 = caps.get(2)?.as_str().parse().ok()?;
            let valid = lat.abs() <= 90.0 && lng.abs() <= 180.0;
            valid.then(|| LatLng::new(lat, lng))
        })
        .collect()
}

/// Split a `|`-separated waypoint list, dropping blanks.
fn split_waypoints(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Percent-decode a path segment, treating `+` as a space.
fn decode_segment(segment: &str) -> String {
    form_urlencoded::parse(segment.as_bytes())
        .map(|(k, v)| if v.is_empty() { k.into_owned() } else { format!("{k}={v}") })
        .collect::<Vec<_>>()
        .join("&")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn query_with_primary_names() {
        let u = url(
            "https://www.google.com/maps/dir/?api=1&origin=Tokyo&destination=Osaka&waypoints=Nagoya%7CKyoto",
        );
        let places = parse_from_query(&u);
        assert_eq!(places.origin.as_deref(), Some("Tokyo"));
        assert_eq!(places.destination.as_deref(), Some("Osaka"));
        assert_eq!(places.waypoints, vec!["Nagoya", "Kyoto"]);
    }

    #[test]
    fn query_with_legacy_aliases() {
        let u = url("https://maps.google.com/maps?saddr=%E6%9D%B1%E4%BA%AC%E9%A7%85&daddr=%E5%A4%A7%E9%98%AA%E9%A7%85");
        let places = parse_from_query(&u);
        assert_eq!(places.origin.as_deref(), Some("東京駅"));
        assert_eq!(places.destination.as_deref(), Some("大阪駅"));
        assert!(places.waypoints.is_empty());
    }

    #[test]
    fn query_ignores_blank_values() {
        let u = url("https://www.google.com/maps?origin=&source=Sendai&dest=Aomori");
        let places = parse_from_query(&u);
        assert_eq!(places.origin.as_deref(), Some("Sendai"));
        assert_eq!(places.destination.as_deref(), Some("Aomori"));
    }

    #[test]
    fn path_with_waypoints_and_view_state() {
        let u = url(
            "https://www.google.com/maps/dir/%E6%9D%B1%E4%BA%AC/%E5%90%8D%E5%8F%A4%E5%B1%8B/%E5%A4%A7%E9%98%AA/@35.1,137.2,8z/data=!4m2!4m1!3e0",
        );
        let places = parse_from_path(&u);
        assert_eq!(places.origin.as_deref(), Some("東京"));
        assert_eq!(places.destination.as_deref(), Some("大阪"));
        assert_eq!(places.waypoints, vec!["名古屋"]);
    }

    #[test]
    fn path_plus_means_space() {
        let u = url("https://www.google.com/maps/dir/Shin+Osaka+Station/Kobe/");
        let places = parse_from_path(&u);
        assert_eq!(places.origin.as_deref(), Some("Shin Osaka Station"));
        assert_eq!(places.destination.as_deref(), Some("Kobe"));
    }

    #[test]
    fn path_needs_two_places() {
        let u = url("https://www.google.com/maps/dir/Tokyo/@35.6,139.7,12z");
        assert_eq!(parse_from_path(&u), ExtractedPlaces::default());
    }

    #[test]
    fn path_without_marker() {
        let u = url("https://www.google.com/maps/place/Tokyo+Tower/@35.65,139.74,17z");
        assert_eq!(parse_from_path(&u), ExtractedPlaces::default());
    }

    #[test]
    fn view_state_detection() {
        assert!(is_view_state_segment("@35.6,139.7,12z"));
        assert!(is_view_state_segment("data=!4m2"));
        assert!(is_view_state_segment("am=t"));
        assert!(!is_view_state_segment("Tokyo"));
    }

    #[test]
    fn coordinate_pairs_from_data_blob() {
        let expanded = "https://www.google.com/maps/dir//@35.3,137.5,8z/data=!4m14!4m13!1m5!1m1!1s0x0:0x0!2m2!1d139.7671248!2d35.6812362!1m5!1m1!1s0x0:0x1!2m2!1d135.4959!2d34.7025";
        let pairs = extract_coordinate_pairs(expanded);
        assert_eq!(pairs.len(), 2);
        assert!((pairs[0].lat - 35.6812362).abs() < 1e-9);
        assert!((pairs[0].lng - 139.7671248).abs() < 1e-9);
        assert!((pairs[1].lat - 34.7025).abs() < 1e-9);
    }

    #[test]
    fn coordinate_pairs_escaped() {
        let expanded = "https://www.google.com/maps/dir/data=%211d139.1%212d35.1%211d136.9%212d35.2";
        let pairs = extract_coordinate_pairs(expanded);
        assert_eq!(pairs.len(), 2);
        assert!((pairs[1].lng - 136.9).abs() < 1e-9);
    }

    #[test]
    fn coordinate_pairs_out_of_range_dropped() {
        let pairs = extract_coordinate_pairs("!1d200.0!2d35.0!1d139.0!2d95.0");
        assert!(pairs.is_empty());
    }
}
