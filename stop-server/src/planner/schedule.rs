//! Rest windows: where the driver must break before the drive limit.
//!
//! The scheduler walks elapsed drive time in steps of the drive limit. For
//! each step it looks at the final half hour before the limit is reached
//! and offers the rest candidates whose ETA falls in that band.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{StopCandidate, add_minutes, minutes_between};

/// Continuous driving allowed before a break, in minutes.
pub const DRIVE_LIMIT_MIN: f64 = 240.0;
/// Drive limit when the driver may extend it.
pub const EXTENDED_DRIVE_LIMIT_MIN: f64 = 270.0;
/// Width of the band before each limit, and the mandated break length.
pub const BREAK_BAND_MIN: f64 = 30.0;

const MAX_PRIMARY: usize = 8;
const MAX_BACKUP: usize = 4;

/// How the driver takes the mandated break.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestStyle {
    /// One 30 minute break.
    #[default]
    #[serde(rename = "SINGLE_30")]
    Single30,
    /// Breaks of at least 10 minutes adding up to 30.
    #[serde(rename = "MULTI_10")]
    Multi10,
}

impl RestStyle {
    /// Total break time the style must add up to.
    pub fn target_break_min(&self) -> f64 {
        // both styles total the same mandated break
        match self {
            RestStyle::Single30 | RestStyle::Multi10 => BREAK_BAND_MIN,
        }
    }
}

/// One mandated break and the candidates for it.
#[derive(Debug, Clone, PartialEq)]
pub struct RestWindow {
    /// 1-based, increasing with time
    pub window_id: u32,
    pub target_drive_limit_min: f64,
    /// Start of the band, minutes after departure
    pub start_after_min: f64,
    /// End of the band, minutes after departure
    pub end_by_min: f64,
    pub target_break_min: f64,
    /// Instant the drive limit is reached
    pub eta: DateTime<Utc>,
    pub primary_candidates: Vec<StopCandidate>,
    pub backup_candidates: Vec<StopCandidate>,
}

/// Drive limit for a request.
pub fn drive_limit_min(allow_extended_drive: bool) -> f64 {
    if allow_extended_drive {
        EXTENDED_DRIVE_LIMIT_MIN
    } else {
        DRIVE_LIMIT_MIN
    }
}

/// Build every rest window for a trip.
///
/// Windows are emitted while `elapsed < total + 30`, so the last one may
/// fall after arrival and have no candidates. A candidate can be offered
/// in more than one window when bands overlap.
pub fn build_rest_windows(
    total_duration_min: f64,
    depart_at: DateTime<Utc>,
    candidates: &[StopCandidate],
    allow_extended_drive: bool,
    style: RestStyle,
) -> Vec<RestWindow> {
    let limit = drive_limit_min(allow_extended_drive);
    let mut windows = Vec::new();
    let mut elapsed = limit;
    let mut window_id = 1;

    while elapsed < total_duration_min + BREAK_BAND_MIN {
        let start = (elapsed - BREAK_BAND_MIN).max(BREAK_BAND_MIN);
        let end = elapsed;

        let mut eligible: Vec<&StopCandidate> = candidates
            .iter()
            .filter(|c| c.distance_from_start_km >= 0.0)
            .filter(|c| {
                let offset = minutes_between(depart_at, c.eta);
                offset >= start && offset <= end
            })
            .collect();
        eligible.sort_by(|a, b| a.distance_from_route_km.total_cmp(&b.distance_from_route_km));

        windows.push(RestWindow {
            window_id,
            target_drive_limit_min: limit,
            start_after_min: start,
            end_by_min: end,
            target_break_min: style.target_break_min(),
            eta: add_minutes(depart_at, elapsed),
            primary_candidates: eligible.iter().take(MAX_PRIMARY).map(|c| (*c).clone()).collect(),
            backup_candidates: eligible
                .iter()
                .skip(MAX_PRIMARY)
                .take(MAX_BACKUP)
                .map(|c| (*c).clone())
                .collect(),
        });

        elapsed += limit;
        window_id += 1;
    }

    windows
}
