use std::cmp::Ordering;
use std::fmt;

use crate::geomath::{is_valid_latitude, INVALID_LATITUDE};
use crate::tables::years_to_myr;

/// Paleolatitude of the site at one age, with its uncertainty bounds.
///
/// Bounds are [`INVALID_LATITUDE`] when the polar wander path carries no A95
/// for that age.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaleolatitudeEntry {
    pub age_years_lower_bound: u64,
    pub age_years: u64,
    pub age_years_upper_bound: u64,
    pub palat_min: f64,
    pub palat: f64,
    pub palat_max: f64,
    /// Reference plate whose polar wander path produced this value.
    pub computed_using_plate_id: u32,
    pub is_interpolated: bool,
}

impl PaleolatitudeEntry {
    pub fn new(
        age_years: u64,
        palat_min: f64,
        palat: f64,
        palat_max: f64,
        computed_using_plate_id: u32,
    ) -> Self {
        Self {
            age_years_lower_bound: age_years,
            age_years,
            age_years_upper_bound: age_years,
            palat_min,
            palat,
            palat_max,
            computed_using_plate_id,
            is_interpolated: false,
        }
    }

    pub fn age_myr(&self) -> f64 {
        years_to_myr(self.age_years)
    }

    pub fn has_bounds(&self) -> bool {
        is_valid_latitude(self.palat_min) && is_valid_latitude(self.palat_max)
    }

    /// Chronological order; at equal ages, entries computed against
    /// `anchor_plate_id` come first.
    pub fn compare_by_age(&self, other: &Self, anchor_plate_id: u32) -> Ordering {
        self.age_years.cmp(&other.age_years).then_with(|| {
            let a = self.computed_using_plate_id == anchor_plate_id;
            let b = other.computed_using_plate_id == anchor_plate_id;
            b.cmp(&a)
        })
    }
}

impl Default for PaleolatitudeEntry {
    fn default() -> Self {
        Self::new(0, INVALID_LATITUDE, INVALID_LATITUDE, INVALID_LATITUDE, 0)
    }
}

fn fmt_latitude(latitude: f64) -> String {
    if is_valid_latitude(latitude) {
        format!("{}", latitude)
    } else {
        "n/a".to_string()
    }
}

impl fmt::Display for PaleolatitudeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Paleolatitude for age {} (Myr): Λ_min = {}, Λ = {}, Λ_max = {}",
            self.age_myr(),
            fmt_latitude(self.palat_min),
            fmt_latitude(self.palat),
            fmt_latitude(self.palat_max)
        )?;
        if self.is_interpolated {
            write!(f, " (interpolated)")
        } else {
            write!(
                f,
                " (using polar wander path of plate {})",
                self.computed_using_plate_id
            )
        }
    }
}
