//! Merging candidate lists that may describe the same facility twice.

use std::collections::HashMap;

use crate::domain::{CandidateSource, StopCandidate};

/// Identity of a physical facility across sources.
///
/// Coordinates are rounded to three decimals (about 100 m).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    brand: String,
    name: String,
    lat_milli: i64,
    lng_milli: i64,
}

/// Lowercase and collapse internal whitespace.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn candidate_key(candidate: &StopCandidate) -> CandidateKey {
    CandidateKey {
        brand: candidate
            .brand
            .map_or_else(|| "-".to_string(), |b| b.code().to_string()),
        name: normalize_name(&candidate.name),
        lat_milli: (candidate.lat * 1000.0).round() as i64,
        lng_milli: (candidate.lng * 1000.0).round() as i64,
    }
}

/// Collapse candidates with the same key, keeping first-seen order.
///
/// A master-catalog record replaces a record from any other source;
/// otherwise the first one seen wins. Merging an already merged list
/// returns it unchanged.
pub fn merge_candidates(candidates: impl IntoIterator<Item = StopCandidate>) -> Vec<StopCandidate> {
    let mut index: HashMap<CandidateKey, usize> = HashMap::new();
    let mut out: Vec<StopCandidate> = Vec::new();

    for candidate in candidates {
        let key = candidate_key(&candidate);
        match index.get(&key) {
            Some(&i) => {
                let replaces = candidate.source == CandidateSource::LocalMaster
                    && out[i].source != CandidateSource::LocalMaster;
                if replaces {
                    out[i] = candidate;
                }
            }
            None => {
                index.insert(key, out.len());
                out.push(candidate);
            }
        }
    }

    out
}

/// Keep candidates no further than `corridor_km` from the route.
pub fn within_corridor(candidates: Vec<StopCandidate>, corridor_km: f64) -> Vec<StopCandidate> {
    candidates
        .into_iter()
        .filter(|c| c.distance_from_route_km <= corridor_km)
        .collect()
}
