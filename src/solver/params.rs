//! Query parameters: a site and one way of specifying the ages of interest.

use crate::coordinate::Coordinate;
use crate::error::{PaleoError, Result};
use crate::tables::{fractional_myr_to_years, YEARS_PER_MYR};

/// Slack on coordinate ranges for values rounded by the caller.
const COORDINATE_TOLERANCE: f64 = 0.001;

const ONE_OF_MSG: &str = "expecting exactly one of (1) age, (2) age and age-pm, (3) min-age and max-age (optionally with age), or (4) all-ages";

/// How the ages of interest are specified. All values are in Myr.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgeSpec {
    /// A single age.
    Single { age: f64 },
    /// An inclusive range, optionally with a point of interest inside it.
    Range { min: f64, max: f64, age: Option<f64> },
    /// `age ± error`; the lower end is clamped at 0.
    PlusMinus { age: f64, error: f64 },
    /// Every age in the rotation model.
    AllAges,
}

/// Loose, possibly conflicting age options as given on a command line.
#[derive(Debug, Clone, Default)]
pub struct AgeOptions {
    pub age: Option<f64>,
    pub age_min: Option<f64>,
    pub age_max: Option<f64>,
    pub age_pm: Option<f64>,
    pub all_ages: bool,
}

impl AgeOptions {
    /// Resolve the options into one [`AgeSpec`], rejecting combinations that
    /// mix specification modes.
    pub fn into_spec(self) -> Result<AgeSpec> {
        let invalid = |msg: &str| Err(PaleoError::ParameterValidation(msg.to_string()));
        match self {
            AgeOptions {
                all_ages: true,
                age: None,
                age_min: None,
                age_max: None,
                age_pm: None,
            } => Ok(AgeSpec::AllAges),
            AgeOptions { all_ages: true, .. } => invalid(ONE_OF_MSG),
            AgeOptions {
                age_min: Some(_),
                age_pm: Some(_),
                ..
            }
            | AgeOptions {
                age_max: Some(_),
                age_pm: Some(_),
                ..
            } => invalid(ONE_OF_MSG),
            AgeOptions {
                age_min: Some(min),
                age_max: Some(max),
                age,
                ..
            } => Ok(AgeSpec::Range { min, max, age }),
            AgeOptions { age_min: Some(_), .. } | AgeOptions { age_max: Some(_), .. } => {
                invalid("only one of min-age or max-age specified, please specify either both or neither")
            }
            AgeOptions {
                age: Some(age),
                age_pm: Some(error),
                ..
            } => Ok(AgeSpec::PlusMinus { age, error }),
            AgeOptions { age_pm: Some(_), .. } => {
                invalid("age-pm specified, but age missing")
            }
            AgeOptions { age: Some(age), .. } => Ok(AgeSpec::Single { age }),
            _ => invalid(ONE_OF_MSG),
        }
    }
}

/// Resolved age window in years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeWindow {
    pub min_years: u64,
    pub max_years: u64,
    /// Point of interest, if one was requested.
    pub age_years: Option<u64>,
    pub all_ages: bool,
}

impl AgeWindow {
    /// Whole-Myr bounds for the rotation table lookup: the window widened
    /// outward to the enclosing integer ages.
    pub fn table_bounds(&self) -> (u32, u32) {
        if self.all_ages {
            return (0, u32::MAX);
        }
        let min = self.min_years / YEARS_PER_MYR;
        let max = self.max_years.div_ceil(YEARS_PER_MYR);
        (
            u32::try_from(min).unwrap_or(u32::MAX),
            u32::try_from(max).unwrap_or(u32::MAX),
        )
    }

    /// Ages that need an exact value: window bounds and the point of interest.
    pub fn interpolation_targets(&self) -> Vec<u64> {
        if self.all_ages {
            return Vec::new();
        }
        let mut targets = vec![self.min_years];
        targets.extend(self.age_years);
        targets.push(self.max_years);
        targets.sort_unstable();
        targets.dedup();
        targets
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameters {
    pub site: Coordinate,
    pub ages: AgeSpec,
}

impl QueryParameters {
    pub fn new(site: Coordinate, ages: AgeSpec) -> Self {
        Self { site, ages }
    }

    /// Build from loose options; see [`AgeOptions::into_spec`].
    pub fn from_options(latitude: f64, longitude: f64, options: AgeOptions) -> Result<Self> {
        let params = Self::new(Coordinate::new(latitude, longitude), options.into_spec()?);
        params.validate()?;
        Ok(params)
    }

    /// Check site ranges and age consistency.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(PaleoError::ParameterValidation(msg));

        let lat = self.site.latitude;
        let lon = self.site.longitude;
        if !lat.is_finite() || lat.abs() > 90.0 + COORDINATE_TOLERANCE {
            return invalid(format!(
                "invalid site latitude {}, expecting a latitude in the range [-90, 90]",
                lat
            ));
        }
        if !lon.is_finite() || lon.abs() > 180.0 + COORDINATE_TOLERANCE {
            return invalid(format!(
                "invalid site longitude {}, expecting a longitude in the range [-180, 180]",
                lon
            ));
        }

        let check_age = |name: &str, v: f64| {
            if !v.is_finite() || v < 0.0 {
                invalid(format!("{} must be a non-negative number of Myr, got {}", name, v))
            } else {
                Ok(())
            }
        };

        match self.ages {
            AgeSpec::Single { age } => check_age("age", age),
            AgeSpec::PlusMinus { age, error } => {
                check_age("age", age)?;
                check_age("age-pm", error)
            }
            AgeSpec::Range { min, max, age } => {
                check_age("min-age", min)?;
                check_age("max-age", max)?;
                if min > max {
                    return invalid(format!("min-age {} exceeds max-age {}", min, max));
                }
                if let Some(age) = age {
                    check_age("age", age)?;
                    if age < min || age > max {
                        return invalid(format!(
                            "age {} not within bounds of [{}, {}]",
                            age, min, max
                        ));
                    }
                }
                Ok(())
            }
            AgeSpec::AllAges => Ok(()),
        }
    }

    /// The requested point age in years, if any.
    pub fn age_years(&self) -> Option<u64> {
        match self.ages {
            AgeSpec::Single { age } | AgeSpec::PlusMinus { age, .. } => {
                Some(fractional_myr_to_years(age))
            }
            AgeSpec::Range { age, .. } => age.map(fractional_myr_to_years),
            AgeSpec::AllAges => None,
        }
    }

    pub fn is_all_ages(&self) -> bool {
        matches!(self.ages, AgeSpec::AllAges)
    }

    pub fn age_window(&self) -> AgeWindow {
        let (min, max) = match self.ages {
            AgeSpec::Single { age } => (age, age),
            AgeSpec::Range { min, max, .. } => (min, max),
            AgeSpec::PlusMinus { age, error } => ((age - error).max(0.0), age + error),
            AgeSpec::AllAges => (0.0, f64::INFINITY),
        };
        AgeWindow {
            min_years: fractional_myr_to_years(min),
            max_years: if max.is_finite() {
                fractional_myr_to_years(max)
            } else {
                u64::MAX
            },
            age_years: self.age_years(),
            all_ages: self.is_all_ages(),
        }
    }
}
