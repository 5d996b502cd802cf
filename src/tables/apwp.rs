//! Apparent polar wander paths: the paleomagnetic pole of a reference plate
//! through time, with its A95 confidence radius.

use std::collections::HashMap;
use std::path::Path;

use rkyv::{Archive, Deserialize, Serialize};
use tracing::info;

use crate::coordinate::Coordinate;
use crate::error::{PaleoError, Result};
use crate::formats::csv::{decode_file, decode_rows, CsvRow};
use crate::geomath::MIN_A95;

const COLUMNS: usize = 5;

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct ApwpEntry {
    pub plate_id: u32,
    /// Age in Myr.
    pub age: u32,
    /// 95% confidence radius of the pole, degrees.
    pub a95: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl ApwpEntry {
    pub fn pole(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn has_uncertainty(&self) -> bool {
        self.a95 > MIN_A95
    }

    fn from_row(row: &CsvRow<'_>) -> Result<Self> {
        Ok(Self {
            plate_id: row.get(0)?,
            age: row.get(1)?,
            a95: row.get(2)?,
            latitude: row.get(3)?,
            longitude: row.get(4)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ApwpTable {
    entries: Vec<ApwpEntry>,
    index: HashMap<(u32, u32), usize>,
}

impl ApwpTable {
    /// Build a table; ages must be strictly increasing per plate.
    pub fn new(entries: Vec<ApwpEntry>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        let mut last_age: HashMap<u32, u32> = HashMap::new();

        for (i, entry) in entries.iter().enumerate() {
            if let Some(&prev) = last_age.get(&entry.plate_id) {
                if entry.age <= prev {
                    return Err(PaleoError::DataConsistency(format!(
                        "polar wander path of plate {} is not strictly increasing in age ({} Myr after {} Myr)",
                        entry.plate_id, entry.age, prev
                    )));
                }
            }
            last_age.insert(entry.plate_id, entry.age);
            index.insert((entry.plate_id, entry.age), i);
        }

        Ok(Self { entries, index })
    }

    pub fn from_csv_str(data: &str, source: &str) -> Result<Self> {
        Self::new(decode_rows(data, source, COLUMNS, ApwpEntry::from_row)?)
    }

    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let table = Self::new(decode_file(&path, COLUMNS, ApwpEntry::from_row)?)?;
        info!(
            "Loaded {} polar wander path entries from {}",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    /// Pole of `plate_id` at exactly `age` Myr.
    pub fn entry_for(&self, plate_id: u32, age: u32) -> Result<&ApwpEntry> {
        self.index
            .get(&(plate_id, age))
            .map(|&i| &self.entries[i])
            .ok_or_else(|| {
                PaleoError::not_found(
                    "Polar wander path entry",
                    format!("plate {} at {} Myr", plate_id, age),
                )
            })
    }

    pub fn contains(&self, plate_id: u32, age: u32) -> bool {
        self.index.contains_key(&(plate_id, age))
    }

    pub fn all_entries(&self) -> &[ApwpEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = "plate_id;age;a95;lat;lon\n\
                        701;0;2.0;87.0;200.0\n\
                        701;10;1.9;86.0;205.0\n\
                        701;20;0;84.5;210.0\n\
                        101;0;3.0;88.0;190.0\n";

    #[test]
    fn test_entry_for() {
        let table = ApwpTable::from_csv_str(DATA, "apwp.csv").unwrap();
        assert_eq!(table.len(), 4);
        let e = table.entry_for(701, 10).unwrap();
        assert_eq!(e.a95, 1.9);
        assert_eq!(e.pole(), Coordinate::new(86.0, 205.0));
        assert!(e.has_uncertainty());
        assert!(!table.entry_for(701, 20).unwrap().has_uncertainty());
        assert!(table.contains(101, 0));
    }

    #[test]
    fn test_missing_entry() {
        let table = ApwpTable::from_csv_str(DATA, "apwp.csv").unwrap();
        let err = table.entry_for(701, 15).unwrap_err();
        assert!(matches!(err, PaleoError::DataNotFound { .. }));
        assert!(table.entry_for(201, 0).is_err());
    }

    #[test]
    fn test_ages_strictly_increasing() {
        let data = "701;0;2.0;87.0;200.0\n701;0;2.0;87.0;200.0\n";
        let err = ApwpTable::from_csv_str(data, "apwp.csv").unwrap_err();
        assert!(matches!(err, PaleoError::DataConsistency(_)));

        let data = "701;10;2.0;87.0;200.0\n701;5;2.0;87.0;200.0\n";
        assert!(ApwpTable::from_csv_str(data, "apwp.csv").is_err());
    }

    #[test]
    fn test_wrong_column_count() {
        let data = "701;0;2.0;87.0;200.0\n701;10;2.0;87.0\n";
        let err = ApwpTable::from_csv_str(data, "apwp.csv").unwrap_err();
        assert!(matches!(err, PaleoError::Parse { line: 2, .. }));
    }
}
