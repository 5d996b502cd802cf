//! Euler rotation table: how each plate moved relative to a reference plate.
//!
//! A row `(plate, age, lat, lon, angle, relative_to)` says that at `age` Myr
//! the plate `plate` is rotated by `angle` degrees about the pole `(lat, lon)`
//! relative to plate `relative_to`. Where the reference plate changes along
//! the chain, the table holds two rows at the same (plate, age): one for
//! each reference plate.

use std::collections::BTreeMap;
use std::path::Path;

use rkyv::{Archive, Deserialize, Serialize};
use tracing::info;

use crate::coordinate::Coordinate;
use crate::error::{PaleoError, Result};
use crate::formats::csv::{decode_file, decode_rows, CsvRow};
use crate::geomath::EulerRotation;

/// Maximum rows per (plate, age): one cross-over pair.
pub const MAX_ENTRIES_PER_AGE: usize = 2;

const COLUMNS: usize = 6;

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct EulerPoleEntry {
    pub plate_id: u32,
    /// Age in Myr.
    pub age: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// Rotation angle in degrees.
    pub rotation: f64,
    /// Plate this rotation is relative to; its polar wander path supplies the pole.
    pub relative_plate_id: u32,
}

impl EulerPoleEntry {
    pub fn euler_rotation(&self) -> EulerRotation {
        EulerRotation::new(Coordinate::new(self.latitude, self.longitude), self.rotation)
    }

    fn from_row(row: &CsvRow<'_>) -> Result<Self> {
        Ok(Self {
            plate_id: row.get(0)?,
            age: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            rotation: row.get(4)?,
            relative_plate_id: row.get(5)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct EulerTable {
    entries: Vec<EulerPoleEntry>,
    /// (plate, age) → indices into `entries`, in source order.
    index: BTreeMap<(u32, u32), Vec<usize>>,
}

impl EulerTable {
    /// Build a table, checking age ordering and the cross-over limit per plate.
    pub fn new(entries: Vec<EulerPoleEntry>) -> Result<Self> {
        let mut index: BTreeMap<(u32, u32), Vec<usize>> = BTreeMap::new();
        let mut last_age: BTreeMap<u32, u32> = BTreeMap::new();

        for (i, entry) in entries.iter().enumerate() {
            if let Some(&prev) = last_age.get(&entry.plate_id) {
                if entry.age < prev {
                    return Err(PaleoError::DataConsistency(format!(
                        "Euler rotations for plate {} are not in age order ({} Myr after {} Myr)",
                        entry.plate_id, entry.age, prev
                    )));
                }
            }
            last_age.insert(entry.plate_id, entry.age);

            let slot = index.entry((entry.plate_id, entry.age)).or_default();
            if slot
                .iter()
                .any(|&j| entries[j].relative_plate_id == entry.relative_plate_id)
            {
                return Err(PaleoError::DataConsistency(format!(
                    "plate {} has duplicate Euler rotations relative to plate {} at {} Myr",
                    entry.plate_id, entry.relative_plate_id, entry.age
                )));
            }
            slot.push(i);
            if slot.len() > MAX_ENTRIES_PER_AGE {
                return Err(PaleoError::DataConsistency(format!(
                    "plate {} has {} Euler rotations at {} Myr, at most {} allowed",
                    entry.plate_id,
                    slot.len(),
                    entry.age,
                    MAX_ENTRIES_PER_AGE
                )));
            }
        }

        Ok(Self { entries, index })
    }

    pub fn from_csv_str(data: &str, source: &str) -> Result<Self> {
        Self::new(decode_rows(data, source, COLUMNS, EulerPoleEntry::from_row)?)
    }

    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let table = Self::new(decode_file(&path, COLUMNS, EulerPoleEntry::from_row)?)?;
        info!(
            "Loaded {} Euler rotations from {}",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    pub fn all_entries(&self) -> &[EulerPoleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct tabulated ages for `plate_id`, ascending.
    pub fn ages_for(&self, plate_id: u32) -> Vec<u32> {
        self.index
            .range((plate_id, 0)..=(plate_id, u32::MAX))
            .map(|(&(_, age), _)| age)
            .collect()
    }

    /// Tabulated ages needed to cover `[min_age, max_age]` for `plate_id`.
    ///
    /// Every age inside the window, plus the nearest age below `min_age` and
    /// the nearest age above `max_age` when the window edge itself is not
    /// tabulated, so that the edges can be interpolated. Ascending, without
    /// duplicates. Empty when the plate has no rotations.
    pub fn relevant_ages(&self, plate_id: u32, min_age: u32, max_age: u32) -> Vec<u32> {
        let ages = self.ages_for(plate_id);
        let mut res: Vec<u32> = ages
            .iter()
            .copied()
            .filter(|&age| age >= min_age && age <= max_age)
            .collect();

        if let Some(&left) = ages.iter().rev().find(|&&age| age <= min_age) {
            if left < min_age {
                res.insert(0, left);
            }
        }
        if let Some(&right) = ages.iter().find(|&&age| age >= max_age) {
            if right > max_age {
                res.push(right);
            }
        }
        res
    }

    /// The one or two rotations of `plate_id` at exactly `age` Myr.
    pub fn entries_for(&self, plate_id: u32, age: u32) -> Result<Vec<&EulerPoleEntry>> {
        match self.index.get(&(plate_id, age)) {
            Some(idx) => Ok(idx.iter().map(|&i| &self.entries[i]).collect()),
            None => Err(PaleoError::not_found(
                "Euler rotation",
                format!("plate {} at {} Myr", plate_id, age),
            )),
        }
    }

    /// `true` when any rotation is tabulated for `plate_id`.
    pub fn has_plate(&self, plate_id: u32) -> bool {
        self.index
            .range((plate_id, 0)..=(plate_id, u32::MAX))
            .next()
            .is_some()
    }
}
