//! Encoded polyline geometry.
//!
//! Routing providers return route geometry as an encoded polyline: each
//! coordinate is the signed delta from the previous one at 1e-5 degree
//! precision, zig-zag encoded and split into 5-bit groups offset by 63.

use super::geo::LatLng;

const PRECISION: f64 = 1e5;

/// Decode a polyline into coordinates in visiting order.
///
/// A truncated trailing group ends decoding; the partial point is dropped.
///
/// # Examples
///
/// ```
/// use stop_server::domain::decode_polyline;
///
/// let points = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@");
/// assert_eq!(points.len(), 3);
/// assert!((points[0].lat - 38.5).abs() < 1e-9);
/// assert!((points[0].lng + 120.2).abs() < 1e-9);
/// ```
pub fn decode_polyline(encoded: &str) -> Vec<LatLng> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut points = Vec::new();

    while index < bytes.len() {
        let Some(d_lat) = next_value(bytes, &mut index) else {
            break;
        };
        let Some(d_lng) = next_value(bytes, &mut index) else {
            break;
        };
        lat = lat.wrapping_add(d_lat);
        lng = lng.wrapping_add(d_lng);
        points.push(LatLng::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    points
}

/// Encode coordinates as a polyline (inverse of [`decode_polyline`]).
pub fn encode_polyline(points: &[LatLng]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.lat * PRECISION).round() as i64;
        let lng = (point.lng * PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut out);
        encode_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

/// Read one zig-zag varint. Returns `None` when input runs out mid-value.
fn next_value(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = i64::from(*bytes.get(*index)?) - 63;
        *index += 1;
        // Anything longer than 12 groups cannot be a coordinate delta
        if shift > 55 {
            return None;
        }
        result |= (byte & 0x1f) << shift;
        shift += 5;
        if byte < 0x20 {
            break;
        }
    }

    Some(if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

fn encode_value(value: i64, out: &mut String) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= 0x20 {
        out.push(char::from(((0x20 | (v & 0x1f)) + 63) as u8));
        v >>= 5;
    }
    out.push(char::from((v + 63) as u8));
}
