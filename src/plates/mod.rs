//! Tectonic plate geometry and site-to-plate resolution.
//!
//! A tectonic plate may be made of several disjoint parts; each part is a
//! separate [`Plate`] record sharing the plate id.

pub mod locator;

use std::collections::BTreeSet;
use std::path::Path;

use rkyv::{Archive, Deserialize, Serialize};
use tracing::info;

use crate::coordinate::Coordinate;
use crate::error::{PaleoError, Result};
use crate::formats;

pub use locator::{LocatorConfig, RayVotes};

/// Plate whose motion is not constrained by the rotation model.
pub const UNCONSTRAINED_PLATE_ID: u32 = 1001;

/// Base plate of the rotation model (Africa).
pub const ANCHOR_PLATE_ID: u32 = 701;

/// Display name given to every unconstrained or mobile-belt plate.
pub const UNCONSTRAINED_PLATE_NAME: &str = "mobile belt (unconstrained)";

/// One closed boundary ring of a plate, vertices in order; the last vertex
/// connects back to the first.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Plate {
    pub id: u32,
    pub name: String,
    pub polygon: Vec<Coordinate>,
}

impl Plate {
    pub fn new(id: u32, name: &str, polygon: Vec<Coordinate>) -> Self {
        Self {
            id,
            name: filter_plate_name(name),
            polygon,
        }
    }

    /// Consecutive vertex pairs, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (&Coordinate, &Coordinate)> + '_ {
        let n = self.polygon.len();
        (0..n).map(move |i| (&self.polygon[i], &self.polygon[(i + 1) % n]))
    }

    /// `'name' (id)`, for messages.
    pub fn label(&self) -> String {
        format!("'{}' ({})", self.name, self.id)
    }

    pub fn contains(&self, point: &Coordinate, config: &LocatorConfig) -> Result<bool> {
        locator::plate_contains(self, point, config)
    }

    pub fn fully_contains(&self, other: &Plate, config: &LocatorConfig) -> bool {
        locator::plate_fully_contains(self, other, config)
    }
}

/// Collapse the various spellings of unconstrained regions to one name.
fn filter_plate_name(name: &str) -> String {
    let lower = name.to_lowercase();
    if lower.contains("unconstrained") || lower.contains("mobile") {
        UNCONSTRAINED_PLATE_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// All plate parts of a plate model.
#[derive(Debug, Clone, Default, Archive, Serialize, Deserialize)]
pub struct PlateDataset {
    plates: Vec<Plate>,
}

impl PlateDataset {
    pub fn new(plates: Vec<Plate>) -> Self {
        Self { plates }
    }

    /// Read plates from a `.gpml` or `.kml` file.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let source = path.display().to_string();
        let parse: fn(&str, &str) -> Result<Vec<Plate>> = match extension.as_deref() {
            Some("gpml") => formats::gpml::parse_plates,
            Some("kml") => formats::kml::parse_plates,
            _ => {
                return Err(PaleoError::parse(
                    source,
                    0,
                    "unsupported plate file format (expecting .kml or .gpml)",
                ))
            }
        };
        let plates = parse(&std::fs::read_to_string(path)?, &source)?;
        let dataset = Self::new(plates);
        info!(
            "Loaded {} plate parts ({} plates) from {}",
            dataset.len(),
            dataset.count_real_plates(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn plates(&self) -> &[Plate] {
        &self.plates
    }

    pub fn len(&self) -> usize {
        self.plates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }

    /// Name of the first part with `plate_id`.
    pub fn plate_name(&self, plate_id: u32) -> Option<&str> {
        self.plates
            .iter()
            .find(|p| p.id == plate_id)
            .map(|p| p.name.as_str())
    }

    /// Number of distinct plate ids.
    pub fn count_real_plates(&self) -> usize {
        self.plates.iter().map(|p| p.id).collect::<BTreeSet<_>>().len()
    }

    /// The plate part containing `site`; see [`locator::find_plate`].
    pub fn find_plate(&self, site: &Coordinate, config: &LocatorConfig) -> Result<&Plate> {
        locator::find_plate(&self.plates, site, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(id: u32, name: &str) -> Plate {
        Plate::new(
            id,
            name,
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 10.0),
                Coordinate::new(10.0, 5.0),
            ],
        )
    }

    #[test]
    fn test_name_filter() {
        assert_eq!(triangle(1001, "Mobile Belts").name, UNCONSTRAINED_PLATE_NAME);
        assert_eq!(triangle(1001, "UNCONSTRAINED zone").name, UNCONSTRAINED_PLATE_NAME);
        assert_eq!(triangle(701, "Africa").name, "Africa");
    }

    #[test]
    fn test_edges_close_ring() {
        let plate = triangle(1, "t");
        let edges: Vec<_> = plate.edges().collect();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[2].0, &plate.polygon[2]);
        assert_eq!(edges[2].1, &plate.polygon[0]);
    }

    #[test]
    fn test_dataset_lookup() {
        let dataset = PlateDataset::new(vec![
            triangle(701, "Africa"),
            triangle(101, "North America"),
            triangle(101, "North America (Alaska part)"),
        ]);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.count_real_plates(), 2);
        assert_eq!(dataset.plate_name(101), Some("North America"));
        assert_eq!(dataset.plate_name(999), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = PlateDataset::read_from_file("data/plates.shp").unwrap_err();
        assert!(matches!(err, PaleoError::Parse { .. }));
    }
}
