//! Error taxonomy for paleolatitude queries and reference-data loading.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaleoError {
    #[error("Invalid query parameters: {0}")]
    ParameterValidation(String),

    #[error("{what} not found: {detail}")]
    DataNotFound { what: String, detail: String },

    #[error("Site lies in the overlap of plates {first} and {second}, neither contains the other")]
    AmbiguousLocation { first: String, second: String },

    #[error(
        "Cannot decide whether {point} lies in plate {plate}: {inside} rays inside, {outside} outside (likely on a plate border)"
    )]
    IndeterminateLocation {
        plate: String,
        point: String,
        inside: usize,
        outside: usize,
    },

    #[error("Geometry self-check failed: {0}")]
    GeometryConsistency(String),

    #[error("Site lies on plate {plate_id}, which has no reconstruction data")]
    UnconstrainedPlate { plate_id: u32 },

    #[error("Insufficient data to compute paleolatitude: {0}")]
    InsufficientData(String),

    #[error("Cannot interpolate between entries relative to plate {younger} and plate {older}")]
    ReferencePlateMismatch { younger: u32, older: u32 },

    #[error("Inconsistent reference data: {0}")]
    DataConsistency(String),

    #[error("{file}:{line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Results requested before a successful computation")]
    NotComputed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

pub type Result<T> = std::result::Result<T, PaleoError>;

impl PaleoError {
    pub fn not_found(what: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::DataNotFound {
            what: what.into(),
            detail: detail.into(),
        }
    }

    pub fn parse(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// Errors a caller can act on by changing the query, as opposed to
    /// missing reference data or a broken invariant.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ParameterValidation(_)
                | Self::UnconstrainedPlate { .. }
                | Self::InsufficientData(_)
        )
    }

    /// Site-on-border and plate-overlap failures.
    pub fn is_ambiguous_location(&self) -> bool {
        matches!(
            self,
            Self::AmbiguousLocation { .. } | Self::IndeterminateLocation { .. }
        )
    }
}
