//! Reference data bundle: plate polygons, Euler rotations and polar wander
//! paths, loaded together and checked against each other.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rkyv::{Archive, Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PaleoError, Result};
use crate::plates::{Plate, PlateDataset};
use crate::tables::{ApwpEntry, ApwpTable, EulerPoleEntry, EulerTable};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_DATASET_ID: &str = "torsvik-2012-vandervoo-2015";
pub const DEFAULT_PLATES_FILE: &str = "plates.gpml";

const APWP_PREFIX: &str = "apwp-";
const EULER_PREFIX: &str = "euler-";
const CSV_SUFFIX: &str = ".csv";

// ── Input locations ─────────────────────────────────────────────────────────

/// Locations of the three reference inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPaths {
    pub apwp_csv: PathBuf,
    pub euler_csv: PathBuf,
    pub plates_file: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::for_dataset(DEFAULT_DATA_DIR, DEFAULT_DATASET_ID)
    }
}

impl DataPaths {
    /// `apwp-<id>.csv`, `euler-<id>.csv` and the plates file under `dir`.
    pub fn for_dataset<P: AsRef<Path>>(dir: P, dataset_id: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            apwp_csv: dir.join(format!("{}{}{}", APWP_PREFIX, dataset_id, CSV_SUFFIX)),
            euler_csv: dir.join(format!("{}{}{}", EULER_PREFIX, dataset_id, CSV_SUFFIX)),
            plates_file: dir.join(DEFAULT_PLATES_FILE),
        }
    }
}

/// Polar wander path datasets available in `dir`, keyed by dataset id.
///
/// A dataset is any file named `apwp-<id>.csv`.
pub fn known_apwp_datasets<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, PathBuf>> {
    let mut datasets = BTreeMap::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(id) = file_name
            .strip_prefix(APWP_PREFIX)
            .and_then(|rest| rest.strip_suffix(CSV_SUFFIX))
            .filter(|id| !id.is_empty())
        {
            datasets.insert(id.to_string(), path.clone());
        }
    }
    Ok(datasets)
}

// ── Consistency report ──────────────────────────────────────────────────────

/// Cross-references between the Euler table and the polar wander paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// `(relative_plate_id, age)` pairs used by a rotation but absent from
    /// the polar wander paths. Queries touching these fail.
    pub missing_apwp: Vec<(u32, u32)>,
    /// Polar wander path entries no rotation refers to.
    pub unused_apwp: Vec<(u32, u32)>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.missing_apwp.is_empty()
    }
}

// ── Reference data ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub plates: PlateDataset,
    pub euler: EulerTable,
    pub apwp: ApwpTable,
}

/// Flat, serializable form of [`ReferenceData`].
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
struct ReferenceSnapshot {
    plates: Vec<Plate>,
    euler: Vec<EulerPoleEntry>,
    apwp: Vec<ApwpEntry>,
}

impl ReferenceData {
    pub fn new(plates: PlateDataset, euler: EulerTable, apwp: ApwpTable) -> Self {
        Self { plates, euler, apwp }
    }

    /// Read all three inputs from disk.
    pub fn load(paths: &DataPaths) -> Result<Self> {
        let apwp = ApwpTable::read_from_file(&paths.apwp_csv)?;
        let euler = EulerTable::read_from_file(&paths.euler_csv)?;
        let plates = PlateDataset::read_from_file(&paths.plates_file)?;
        let data = Self::new(plates, euler, apwp);

        let report = data.consistency_report();
        for (plate, age) in &report.missing_apwp {
            warn!(
                "Rotations refer to plate {} at {} Myr, which has no polar wander path entry",
                plate, age
            );
        }
        Ok(data)
    }

    /// Every `(relative_plate_id, age)` the rotations need, checked against
    /// the polar wander paths.
    pub fn consistency_report(&self) -> ConsistencyReport {
        let needed: BTreeSet<(u32, u32)> = self
            .euler
            .all_entries()
            .iter()
            .map(|e| (e.relative_plate_id, e.age))
            .collect();
        let available: BTreeSet<(u32, u32)> = self
            .apwp
            .all_entries()
            .iter()
            .map(|e| (e.plate_id, e.age))
            .collect();

        ConsistencyReport {
            missing_apwp: needed.difference(&available).copied().collect(),
            unused_apwp: available.difference(&needed).copied().collect(),
        }
    }

    /// Serialize to `path` with rkyv.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let snapshot = ReferenceSnapshot {
            plates: self.plates.plates().to_vec(),
            euler: self.euler.all_entries().to_vec(),
            apwp: self.apwp.all_entries().to_vec(),
        };
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&snapshot)
            .map_err(|e| PaleoError::Snapshot(format!("rkyv serialization failed: {}", e)))?;
        std::fs::write(path, &bytes)?;
        info!("Saved reference snapshot to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Load a snapshot written by [`save_to_file`](Self::save_to_file); the
    /// tables are rebuilt and re-validated.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let snapshot = rkyv::from_bytes::<ReferenceSnapshot, rkyv::rancor::Error>(&bytes)
            .map_err(|e| PaleoError::Snapshot(format!("rkyv deserialization failed: {}", e)))?;
        let data = Self::new(
            PlateDataset::new(snapshot.plates),
            EulerTable::new(snapshot.euler)?,
            ApwpTable::new(snapshot.apwp)?,
        );
        info!(
            "Loaded reference snapshot: {} plate parts, {} rotations, {} poles",
            data.plates.len(),
            data.euler.len(),
            data.apwp.len()
        );
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Coordinate;

    fn data() -> ReferenceData {
        let euler = EulerTable::from_csv_str(
            "plate;age;lat;lon;rot;rel\n101;0;0;0;0;701\n101;10;60;-30;2.5;701\n101;20;60;-30;5;701\n",
            "euler.csv",
        )
        .unwrap();
        let apwp = ApwpTable::from_csv_str(
            "plate;age;a95;lat;lon\n701;0;2;87;200\n701;10;1.9;86;205\n701;30;2.5;83;215\n",
            "apwp.csv",
        )
        .unwrap();
        let plates = PlateDataset::new(vec![Plate::new(
            101,
            "North America",
            vec![
                Coordinate::new(30.0, -120.0),
                Coordinate::new(30.0, -70.0),
                Coordinate::new(60.0, -70.0),
                Coordinate::new(60.0, -120.0),
            ],
        )]);
        ReferenceData::new(plates, euler, apwp)
    }

    #[test]
    fn test_consistency_report() {
        let report = data().consistency_report();
        assert_eq!(report.missing_apwp, vec![(701, 20)]);
        assert_eq!(report.unused_apwp, vec![(701, 30)]);
        assert!(!report.is_consistent());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let path = std::env::temp_dir().join(format!("paleolatitude-snapshot-{}.rkyv", std::process::id()));
        let original = data();
        original.save_to_file(&path).unwrap();
        let loaded = ReferenceData::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.plates.plates(), original.plates.plates());
        assert_eq!(loaded.euler.all_entries(), original.euler.all_entries());
        assert_eq!(loaded.apwp.all_entries(), original.apwp.all_entries());
    }

    #[test]
    fn test_corrupt_snapshot() {
        let path = std::env::temp_dir().join(format!("paleolatitude-corrupt-{}.rkyv", std::process::id()));
        std::fs::write(&path, b"not a snapshot").unwrap();
        let err = ReferenceData::load_from_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, PaleoError::Snapshot(_)), "{}", err);
    }

    #[test]
    fn test_dataset_paths() {
        let paths = DataPaths::default();
        assert_eq!(
            paths.apwp_csv,
            Path::new("data/apwp-torsvik-2012-vandervoo-2015.csv")
        );
        assert_eq!(
            paths.euler_csv,
            Path::new("data/euler-torsvik-2012-vandervoo-2015.csv")
        );
        assert_eq!(paths.plates_file, Path::new("data/plates.gpml"));
    }

    #[test]
    fn test_known_datasets() {
        let dir = std::env::temp_dir().join(format!("paleolatitude-datasets-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["apwp-a.csv", "apwp-b-2015.csv", "euler-a.csv", "apwp-.csv", "apwp-c.txt"] {
            std::fs::write(dir.join(name), "").unwrap();
        }
        let found = known_apwp_datasets(&dir).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(found.keys().cloned().collect::<Vec<_>>(), vec!["a", "b-2015"]);
        assert!(found["a"].ends_with("apwp-a.csv"));
    }
}
