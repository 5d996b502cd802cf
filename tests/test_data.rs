//! Shared fixture helpers.
//!
//! The fixtures in `tests/data/` are a small synthetic plate model:
//! square plates, stationary rotations for Africa (701), a rotating North
//! America (101), Australia (102) switching reference from 701 to 101 at
//! 30 Myr, and South America (103) switching without a cross-over row.
#![allow(dead_code)]

use std::path::PathBuf;

use paleolatitude::{DataPaths, PaleoLatitude, ReferenceData};

pub const CAPE_TOWN: (f64, f64) = (-33.925278, 18.423889);

/// Absolute path of a file in `tests/data/`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn data_paths() -> DataPaths {
    DataPaths {
        apwp_csv: fixture_path("apwp.csv"),
        euler_csv: fixture_path("euler.csv"),
        plates_file: fixture_path("plates.gpml"),
    }
}

pub fn load_reference_data() -> ReferenceData {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
    ReferenceData::load(&data_paths()).expect("Failed to load fixture data")
}

pub fn solver() -> PaleoLatitude {
    PaleoLatitude::new(load_reference_data())
}

/// A scratch path under the system temp directory, unique per test process.
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("paleolatitude-{}-{}", std::process::id(), name))
}
