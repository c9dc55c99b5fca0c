//! Facility filters chosen by the driver.

use serde::{Deserialize, Serialize};

use super::candidate::{Equipment, FacilityClass};

/// Which facility types the driver wants.
///
/// With no flag set, every type is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FacilityTypeFilter {
    pub sa_pa: bool,
    pub expressway_rest: bool,
    pub michi_no_eki: bool,
}

impl FacilityTypeFilter {
    /// Returns true if at least one type is selected.
    pub fn is_active(&self) -> bool {
        self.sa_pa || self.expressway_rest || self.michi_no_eki
    }

    /// Returns true if the classified facility matches any selected type.
    pub fn accepts(&self, class: &FacilityClass) -> bool {
        if !self.is_active() {
            return true;
        }
        (self.sa_pa && class.is_sa_pa)
            || (self.expressway_rest && class.is_expressway_rest)
            || (self.michi_no_eki && class.is_michi_no_eki)
    }
}

/// Amenities the driver requires.
///
/// Every set flag must be confirmed present; unknown data fails the check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquipmentFilter {
    pub shower: bool,
    pub open24h: bool,
    pub convenience: bool,
    pub large_parking: bool,
}

impl EquipmentFilter {
    /// Returns true if any amenity is required.
    pub fn is_active(&self) -> bool {
        self.shower || self.open24h || self.convenience || self.large_parking
    }

    /// Returns true if `equipment` satisfies every required amenity.
    pub fn accepts(&self, equipment: &Equipment) -> bool {
        !(self.shower && !equipment.shower
            || self.open24h && !equipment.open24h
            || self.convenience && !equipment.convenience
            || self.large_parking && !equipment.large_parking)
    }
}
