//! Paleolatitude solver.
//!
//! A query runs through a fixed sequence of stages:
//!
//! 1. **Validated**: site coordinates and age specification are checked.
//! 2. **PlateResolved**: the plate under the site is found (see [`crate::plates::locator`]).
//! 3. **AgesResolved**: the tabulated rotation ages covering the age window are
//!    collected, including one anchor age on either side of the window.
//! 4. **PerAgeComputed**: for each age and each rotation at that age, the
//!    reference plate's paleomagnetic pole is rotated into the site's plate
//!    frame and the paleolatitude with its A95-derived bounds is computed.
//! 5. **Interpolated**: window edges and the requested age that fall between
//!    tabulated ages are filled in by linear interpolation.
//! 6. **Finalized**: the sorted result set is stored.
//!
//! A failure at any stage aborts the query. Parameter errors, unconstrained
//! plates and empty age windows are reported as a clean `false` from
//! [`PaleoLatitude::compute`]; everything else is returned as an error.

pub mod entry;
pub mod interpolate;
pub mod output;
pub mod params;

use tracing::{debug, error, info, info_span};

use crate::coordinate::Coordinate;
use crate::dataset::ReferenceData;
use crate::error::{PaleoError, Result};
use crate::geomath::{paleolatitude, paleolatitude_bounds, rotate_pole};
use crate::plates::{LocatorConfig, Plate, ANCHOR_PLATE_ID, UNCONSTRAINED_PLATE_ID};
use crate::tables::myr_to_years;

pub use entry::PaleolatitudeEntry;
pub use params::{AgeOptions, AgeSpec, AgeWindow, QueryParameters};

// ── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Base plate of the rotation model; its entries sort first at equal ages.
    pub anchor_plate_id: u32,
    /// Plate with no reconstruction data; queries landing on it are rejected.
    pub unconstrained_plate_id: u32,
    pub locator: LocatorConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            anchor_plate_id: ANCHOR_PLATE_ID,
            unconstrained_plate_id: UNCONSTRAINED_PLATE_ID,
            locator: LocatorConfig::default(),
        }
    }
}

// ── Query state ─────────────────────────────────────────────────────────────

/// Last stage a query completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QueryStage {
    Validated,
    PlateResolved,
    AgesResolved,
    PerAgeComputed,
    Interpolated,
    Finalized,
}

#[derive(Debug, Clone)]
struct QueryResult {
    params: QueryParameters,
    plate: Plate,
    entries: Vec<PaleolatitudeEntry>,
}

// ── Solver ──────────────────────────────────────────────────────────────────

/// Computes paleolatitudes against a fixed set of reference data.
///
/// Holds the result of the most recent successful [`compute`](Self::compute).
#[derive(Debug)]
pub struct PaleoLatitude {
    data: ReferenceData,
    config: SolverConfig,
    stage: Option<QueryStage>,
    result: Option<QueryResult>,
    rejection: Option<PaleoError>,
}

impl PaleoLatitude {
    pub fn new(data: ReferenceData) -> Self {
        Self::with_config(data, SolverConfig::default())
    }

    pub fn with_config(data: ReferenceData, config: SolverConfig) -> Self {
        Self {
            data,
            config,
            stage: None,
            result: None,
            rejection: None,
        }
    }

    pub fn data(&self) -> &ReferenceData {
        &self.data
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Last stage reached by the most recent query.
    pub fn stage(&self) -> Option<QueryStage> {
        self.stage
    }

    /// Why the most recent query returned `false`.
    pub fn rejection(&self) -> Option<&PaleoError> {
        self.rejection.as_ref()
    }

    /// Run a query, replacing any previous result.
    ///
    /// Returns `Ok(false)` when the query is rejected for a reason the caller
    /// can act on (see [`PaleoError::is_recoverable`]); the reason is kept in
    /// [`rejection`](Self::rejection). Missing data, ambiguous locations and
    /// geometry failures are returned as errors.
    pub fn compute(&mut self, params: &QueryParameters) -> Result<bool> {
        self.stage = None;
        self.result = None;
        self.rejection = None;

        let span = info_span!("paleolatitude_query", site = %params.site);
        let _enter = span.enter();

        match self.run(params) {
            Ok((plate, entries)) => {
                info!(
                    "Computed {} paleolatitude entries for site {} on plate {}",
                    entries.len(),
                    params.site,
                    plate.label()
                );
                self.result = Some(QueryResult {
                    params: params.clone(),
                    plate,
                    entries,
                });
                Ok(true)
            }
            Err(e) if e.is_recoverable() => {
                error!("{}", e);
                self.rejection = Some(e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn advance(&mut self, stage: QueryStage) {
        debug!("Query stage: {:?}", stage);
        self.stage = Some(stage);
    }

    fn run(&mut self, params: &QueryParameters) -> Result<(Plate, Vec<PaleolatitudeEntry>)> {
        params.validate()?;
        self.advance(QueryStage::Validated);

        let plate = self
            .data
            .plates
            .find_plate(&params.site, &self.config.locator)?
            .clone();
        info!("Site {} lies on plate {}", params.site, plate.label());
        self.advance(QueryStage::PlateResolved);

        if plate.id == self.config.unconstrained_plate_id {
            return Err(PaleoError::UnconstrainedPlate { plate_id: plate.id });
        }

        let window = params.age_window();
        let (min_age, max_age) = window.table_bounds();
        let ages = self.data.euler.relevant_ages(plate.id, min_age, max_age);
        if ages.is_empty() {
            return Err(PaleoError::InsufficientData(format!(
                "no rotations for plate {} within [{}, {}] Myr. Maybe try computing for all ages?",
                plate.label(),
                min_age,
                max_age
            )));
        }
        debug!("Relevant ages: {:?}", ages);
        self.advance(QueryStage::AgesResolved);

        let mut entries = Vec::with_capacity(ages.len());
        for &age in &ages {
            entries.extend(self.compute_for_age(&params.site, plate.id, age)?);
        }
        let anchor = self.config.anchor_plate_id;
        entries.sort_by(|a, b| a.compare_by_age(b, anchor));
        self.advance(QueryStage::PerAgeComputed);

        let targets: Vec<u64> = window
            .interpolation_targets()
            .into_iter()
            .filter(|&t| !entries.iter().any(|e| e.age_years == t))
            .collect();
        if interpolate::fill_targets(&mut entries, &targets)? > 0 {
            entries.sort_by(|a, b| a.compare_by_age(b, anchor));
        }
        self.advance(QueryStage::Interpolated);

        for entry in &entries {
            debug!("{}", entry);
        }
        self.advance(QueryStage::Finalized);
        Ok((plate, entries))
    }

    /// Paleolatitude of `site`, lying on `plate_id`, at a tabulated `age` in Myr.
    ///
    /// One entry per rotation at that age: two when the rotation model
    /// switches reference plate at `age`.
    pub fn compute_for_age(
        &self,
        site: &Coordinate,
        plate_id: u32,
        age: u32,
    ) -> Result<Vec<PaleolatitudeEntry>> {
        self.data
            .euler
            .entries_for(plate_id, age)?
            .into_iter()
            .map(|euler| {
                let apwp = self.data.apwp.entry_for(euler.relative_plate_id, age)?;
                let pole = rotate_pole(&apwp.pole(), &euler.euler_rotation())?;
                let palat = paleolatitude(site, &pole);
                let (palat_min, palat_max) = paleolatitude_bounds(palat, apwp.a95);
                Ok(PaleolatitudeEntry::new(
                    myr_to_years(age),
                    palat_min,
                    palat,
                    palat_max,
                    euler.relative_plate_id,
                ))
            })
            .collect()
    }

    fn result(&self) -> Result<&QueryResult> {
        self.result.as_ref().ok_or(PaleoError::NotComputed)
    }

    /// Summary over the result set; see [`interpolate::aggregate`].
    pub fn paleolatitude(&self) -> Result<PaleolatitudeEntry> {
        let result = self.result()?;
        interpolate::aggregate(&result.entries, result.params.age_years())
            .ok_or(PaleoError::NotComputed)
    }

    /// Lowest and highest valid paleolatitude or bound in the result set.
    pub fn paleolatitude_bounds(&self) -> Result<(f64, f64)> {
        let summary = self.paleolatitude()?;
        Ok((summary.palat_min, summary.palat_max))
    }

    /// Every entry of the result set, ordered by age.
    pub fn relevant_entries(&self) -> Result<&[PaleolatitudeEntry]> {
        Ok(&self.result()?.entries)
    }

    pub fn resolved_plate(&self) -> Result<&Plate> {
        Ok(&self.result()?.plate)
    }

    pub fn query(&self) -> Result<&QueryParameters> {
        Ok(&self.result()?.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geomath::is_valid_latitude;
    use crate::plates::PlateDataset;
    use crate::tables::{ApwpTable, EulerTable};

    fn square(id: u32, name: &str, lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> Plate {
        Plate::new(
            id,
            name,
            vec![
                Coordinate::new(lat0, lon0),
                Coordinate::new(lat0, lon1),
                Coordinate::new(lat1, lon1),
                Coordinate::new(lat1, lon0),
            ],
        )
    }

    /// Africa with a stationary rotation, and a plate that switches its
    /// reference from Africa to North America at 30 Myr.
    fn solver() -> PaleoLatitude {
        let plates = PlateDataset::new(vec![
            square(701, "Africa", -45.0, 10.0, 5.0, 40.0),
            square(101, "North America", 30.0, -120.0, 60.0, -70.0),
            square(102, "Terrane", 45.0, 20.0, 65.0, 50.0),
            square(1001, "Mobile belt", 25.0, 60.0, 40.0, 80.0),
        ]);
        let euler = EulerTable::from_csv_str(
            "701;0;0;0;0;701\n701;10;0;0;0;701\n701;20;0;0;0;701\n701;30;0;0;0;701\n701;40;0;0;0;701\n\
             101;0;0;0;0;701\n101;10;0;0;0;701\n101;20;0;0;0;701\n101;30;0;0;0;701\n101;40;0;0;0;701\n\
             102;20;0;0;0;701\n102;30;0;0;0;701\n102;30;0;0;0;101\n102;40;0;0;0;101\n",
            "euler.csv",
        )
        .unwrap();
        let apwp = ApwpTable::from_csv_str(
            "701;0;2.0;87.0;200.0\n701;10;1.9;86.0;205.0\n701;20;2.3;84.5;210.0\n701;30;2.5;83.0;215.0\n701;40;2.7;81.5;218.0\n\
             101;30;3.0;80.0;180.0\n101;40;0;78.0;175.0\n",
            "apwp.csv",
        )
        .unwrap();
        PaleoLatitude::new(ReferenceData::new(plates, euler, apwp))
    }

    fn query(lat: f64, lon: f64, ages: AgeSpec) -> QueryParameters {
        QueryParameters::new(Coordinate::new(lat, lon), ages)
    }

    #[test]
    fn test_accessors_before_compute() {
        let pl = solver();
        assert!(matches!(pl.paleolatitude(), Err(PaleoError::NotComputed)));
        assert!(matches!(pl.relevant_entries(), Err(PaleoError::NotComputed)));
        assert!(matches!(pl.resolved_plate(), Err(PaleoError::NotComputed)));
        assert_eq!(pl.stage(), None);
    }

    #[test]
    fn test_single_tabulated_age() {
        let mut pl = solver();
        assert!(pl.compute(&query(-33.925278, 18.423889, AgeSpec::Single { age: 20.0 })).unwrap());
        assert_eq!(pl.stage(), Some(QueryStage::Finalized));
        assert_eq!(pl.resolved_plate().unwrap().id, 701);

        let entries = pl.relevant_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].is_interpolated);

        let summary = pl.paleolatitude().unwrap();
        assert_eq!(summary.age_years, 20_000_000);
        assert!(is_valid_latitude(summary.palat));
        assert!(summary.palat_min < summary.palat && summary.palat < summary.palat_max);
    }

    #[test]
    fn test_interpolated_age() {
        let mut pl = solver();
        assert!(pl.compute(&query(-33.925278, 18.423889, AgeSpec::Single { age: 15.0 })).unwrap());
        let entries = pl.relevant_entries().unwrap();
        let ages: Vec<u64> = entries.iter().map(|e| e.age_years / 1_000_000).collect();
        assert_eq!(ages, vec![10, 15, 20]);
        assert!(entries[1].is_interpolated);
        let expected = 0.5 * (entries[0].palat + entries[2].palat);
        assert!((entries[1].palat - expected).abs() < 1e-9);

        let summary = pl.paleolatitude().unwrap();
        assert!((summary.palat - expected).abs() < 1e-9);
        assert!(summary.is_interpolated);
        assert_eq!(summary.age_years_lower_bound, 10_000_000);
        assert_eq!(summary.age_years_upper_bound, 20_000_000);
    }

    #[test]
    fn test_crossover_sorting() {
        let mut pl = solver();
        assert!(pl.compute(&query(54.0, 35.0, AgeSpec::Single { age: 30.0 })).unwrap());
        let entries = pl.relevant_entries().unwrap();
        let tags: Vec<(u64, u32)> = entries
            .iter()
            .map(|e| (e.age_years / 1_000_000, e.computed_using_plate_id))
            .collect();
        assert_eq!(tags, vec![(30, 701), (30, 101)]);

        // Point estimate comes from the anchor-relative entry
        let summary = pl.paleolatitude().unwrap();
        assert_eq!(summary.palat, entries[0].palat);
        assert_eq!(summary.computed_using_plate_id, 701);
    }

    #[test]
    fn test_crossover_range() {
        let mut pl = solver();
        let ok = pl
            .compute(&query(54.0, 35.0, AgeSpec::Range { min: 20.0, max: 40.0, age: None }))
            .unwrap();
        assert!(ok);
        let entries = pl.relevant_entries().unwrap();
        assert_eq!(entries.len(), 4);
        // No A95 for plate 101 at 40 Myr
        assert!(!entries[3].has_bounds());
        let (lo, hi) = pl.paleolatitude_bounds().unwrap();
        assert!(is_valid_latitude(lo) && is_valid_latitude(hi));
        assert!(lo < hi);
    }

    #[test]
    fn test_interpolation_after_reference_switch() {
        let mut pl = solver();
        assert!(pl.compute(&query(54.0, 35.0, AgeSpec::Single { age: 35.0 })).unwrap());
        let entries = pl.relevant_entries().unwrap();
        let tags: Vec<(u64, u32, bool)> = entries
            .iter()
            .map(|e| (e.age_years / 1_000_000, e.computed_using_plate_id, e.is_interpolated))
            .collect();
        assert_eq!(
            tags,
            vec![(30, 701, false), (30, 101, false), (35, 101, true), (40, 101, false)]
        );
        assert_eq!(pl.paleolatitude().unwrap().computed_using_plate_id, 101);
    }

    #[test]
    fn test_interpolation_across_reference_switch_fails() {
        let mut pl = solver();
        pl.data.euler = EulerTable::from_csv_str("102;30;0;0;0;701\n102;40;0;0;0;101\n", "euler.csv").unwrap();
        let err = pl
            .compute(&query(54.0, 35.0, AgeSpec::Single { age: 35.0 }))
            .unwrap_err();
        assert!(matches!(err, PaleoError::ReferencePlateMismatch { younger: 701, older: 101 }), "{}", err);
        assert_eq!(pl.stage(), Some(QueryStage::PerAgeComputed));
        assert!(pl.relevant_entries().is_err());
    }

    #[test]
    fn test_unconstrained_plate_is_rejected() {
        let mut pl = solver();
        assert!(!pl.compute(&query(32.0, 70.0, AgeSpec::AllAges)).unwrap());
        assert!(matches!(
            pl.rejection(),
            Some(PaleoError::UnconstrainedPlate { plate_id: 1001 })
        ));
        assert_eq!(pl.stage(), Some(QueryStage::PlateResolved));
        assert!(pl.paleolatitude().is_err());
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let mut pl = solver();
        assert!(!pl.compute(&query(95.0, 0.0, AgeSpec::AllAges)).unwrap());
        assert!(matches!(pl.rejection(), Some(PaleoError::ParameterValidation(_))));
        assert_eq!(pl.stage(), None);
    }

    #[test]
    fn test_plate_without_rotations_is_rejected() {
        let mut pl = solver();
        pl.data.euler = EulerTable::from_csv_str("701;0;0;0;0;701\n", "euler.csv").unwrap();
        assert!(!pl.compute(&query(54.0, 35.0, AgeSpec::Single { age: 50.0 })).unwrap());
        assert!(matches!(pl.rejection(), Some(PaleoError::InsufficientData(_))));
        assert_eq!(pl.stage(), Some(QueryStage::PlateResolved));
    }

    #[test]
    fn test_missing_pole_is_hard_error() {
        let mut pl = solver();
        // No pole for plate 101 at 20 Myr
        pl.data.euler = EulerTable::from_csv_str("102;20;0;0;0;101\n", "euler.csv").unwrap();
        let err = pl
            .compute(&query(54.0, 35.0, AgeSpec::Single { age: 20.0 }))
            .unwrap_err();
        assert!(matches!(err, PaleoError::DataNotFound { .. }), "{}", err);
    }

    #[test]
    fn test_site_without_plate_is_hard_error() {
        let mut pl = solver();
        let err = pl.compute(&query(0.0, -30.0, AgeSpec::AllAges)).unwrap_err();
        assert!(matches!(err, PaleoError::DataNotFound { .. }));
    }

    #[test]
    fn test_recompute_replaces_result() {
        let mut pl = solver();
        assert!(pl.compute(&query(-33.925278, 18.423889, AgeSpec::AllAges)).unwrap());
        assert_eq!(pl.relevant_entries().unwrap().len(), 5);
        assert!(!pl.compute(&query(32.0, 70.0, AgeSpec::AllAges)).unwrap());
        assert!(pl.relevant_entries().is_err());
    }
}
