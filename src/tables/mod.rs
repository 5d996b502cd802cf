//! Tabulated reconstruction data keyed by (plate id, age).
//!
//! Ages in the tables are whole million years; everything downstream of the
//! tables works in years.

pub mod apwp;
pub mod euler;

pub use apwp::{ApwpEntry, ApwpTable};
pub use euler::{EulerPoleEntry, EulerTable};

pub const YEARS_PER_MYR: u64 = 1_000_000;

/// Whole table age in Myr to years.
pub fn myr_to_years(age_myr: u32) -> u64 {
    u64::from(age_myr) * YEARS_PER_MYR
}

/// Fractional age in Myr to whole years, rounded.
pub fn fractional_myr_to_years(age_myr: f64) -> u64 {
    (age_myr * YEARS_PER_MYR as f64).round().max(0.0) as u64
}

pub fn years_to_myr(age_years: u64) -> f64 {
    age_years as f64 / YEARS_PER_MYR as f64
}
