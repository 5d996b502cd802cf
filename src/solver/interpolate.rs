//! Filling in non-tabulated ages and reducing a result set to one answer.

use tracing::debug;

use crate::error::{PaleoError, Result};
use crate::geomath::{is_valid_latitude, INVALID_LATITUDE};

use super::entry::PaleolatitudeEntry;

fn lerp(younger: f64, older: f64, fraction: f64) -> f64 {
    if is_valid_latitude(younger) && is_valid_latitude(older) {
        younger + (older - younger) * fraction
    } else {
        INVALID_LATITUDE
    }
}

/// Linear interpolation between two entries at `age_years`.
///
/// Both entries must have been computed against the same reference plate;
/// a missing bound on either side leaves the bound missing.
pub fn interpolate(
    younger: &PaleolatitudeEntry,
    older: &PaleolatitudeEntry,
    age_years: u64,
) -> Result<PaleolatitudeEntry> {
    if younger.computed_using_plate_id != older.computed_using_plate_id {
        return Err(PaleoError::ReferencePlateMismatch {
            younger: younger.computed_using_plate_id,
            older: older.computed_using_plate_id,
        });
    }

    let delta_age = older.age_years as f64 - younger.age_years as f64;
    let fraction = if delta_age == 0.0 {
        0.0
    } else {
        (age_years as f64 - younger.age_years as f64) / delta_age
    };

    let mut res = PaleolatitudeEntry::new(
        age_years,
        lerp(younger.palat_min, older.palat_min, fraction),
        lerp(younger.palat, older.palat, fraction),
        lerp(younger.palat_max, older.palat_max, fraction),
        younger.computed_using_plate_id,
    );
    res.is_interpolated = true;
    Ok(res)
}

/// Append interpolated entries for every target age that falls strictly
/// between two consecutive entries of the sorted `entries`.
///
/// Returns the number of entries added; the caller re-sorts when non-zero.
pub fn fill_targets(entries: &mut Vec<PaleolatitudeEntry>, targets: &[u64]) -> Result<usize> {
    let mut added = Vec::new();
    for pair in entries.windows(2) {
        let (curr, next) = (&pair[0], &pair[1]);
        for &target in targets {
            if target > curr.age_years && target < next.age_years {
                let entry = interpolate(curr, next, target)?;
                debug!("Interpolated {}", entry);
                added.push(entry);
            }
        }
    }
    let n = added.len();
    entries.extend(added);
    Ok(n)
}

/// Reduce a sorted result set to a single summary entry.
///
/// The latitude range spans every valid value and bound in the set, the age
/// range spans every entry. When `requested_age_years` is given, the point
/// estimate is the first entry at exactly that age; otherwise it is
/// [`INVALID_LATITUDE`] and the summary age is the lower age bound.
pub fn aggregate(
    entries: &[PaleolatitudeEntry],
    requested_age_years: Option<u64>,
) -> Option<PaleolatitudeEntry> {
    let first = entries.first()?;
    let mut aggr = PaleolatitudeEntry {
        age_years_lower_bound: first.age_years_lower_bound,
        age_years: first.age_years_lower_bound,
        age_years_upper_bound: first.age_years_upper_bound,
        palat_min: INVALID_LATITUDE,
        palat: INVALID_LATITUDE,
        palat_max: INVALID_LATITUDE,
        computed_using_plate_id: first.computed_using_plate_id,
        is_interpolated: false,
    };
    let mut point_found = false;

    for entry in entries {
        for value in [entry.palat_min, entry.palat] {
            if is_valid_latitude(value)
                && (!is_valid_latitude(aggr.palat_min) || value < aggr.palat_min)
            {
                aggr.palat_min = value;
            }
        }
        for value in [entry.palat_max, entry.palat] {
            if is_valid_latitude(value)
                && (!is_valid_latitude(aggr.palat_max) || value > aggr.palat_max)
            {
                aggr.palat_max = value;
            }
        }

        aggr.age_years_lower_bound = aggr.age_years_lower_bound.min(entry.age_years_lower_bound);
        aggr.age_years_upper_bound = aggr.age_years_upper_bound.max(entry.age_years_upper_bound);

        if !point_found && requested_age_years == Some(entry.age_years) {
            aggr.palat = entry.palat;
            aggr.age_years = entry.age_years;
            aggr.computed_using_plate_id = entry.computed_using_plate_id;
            aggr.is_interpolated = entry.is_interpolated;
            point_found = true;
        }
    }

    if !point_found {
        aggr.age_years = aggr.age_years_lower_bound;
    }
    Some(aggr)
}
