//! Row decoder for the Euler rotation and polar wander path tables.
//!
//! Both tables are plain delimited text with a fixed number of columns.
//! Fields may be separated by `;` or `,` (one per file), and up to two
//! leading header lines are tolerated: a line that does not decode before
//! any row has been read, within the first two lines, is skipped. Any other
//! malformed line is fatal.

use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{PaleoError, Result};

/// Number of leading lines that may be non-data (headers, units).
const MAX_HEADER_LINES: usize = 2;

/// A single record with its source position, for typed column access.
pub struct CsvRow<'a> {
    record: &'a csv::StringRecord,
    source: &'a str,
    line: usize,
}

impl CsvRow<'_> {
    /// Parse column `index` as `T`.
    pub fn get<T: FromStr>(&self, index: usize) -> Result<T> {
        let raw = self.record.get(index).unwrap_or("");
        raw.trim().parse::<T>().map_err(|_| {
            PaleoError::parse(
                self.source,
                self.line,
                format!("unexpected value '{}' in column {}", raw, index + 1),
            )
        })
    }
}

/// Pick `;` when the text contains one, otherwise `,`.
fn sniff_delimiter(data: &str) -> u8 {
    if data.contains(';') {
        b';'
    } else {
        b','
    }
}

/// Decode every data row of `data` with `decode`.
///
/// `source` names the input in error messages. Rows must have exactly
/// `columns` fields.
pub fn decode_rows<T, F>(data: &str, source: &str, columns: usize, decode: F) -> Result<Vec<T>>
where
    F: Fn(&CsvRow<'_>) -> Result<T>,
{
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(data))
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        let header_allowed = rows.is_empty() && line <= MAX_HEADER_LINES;

        let decoded = if record.len() != columns {
            Err(PaleoError::parse(
                source,
                line,
                format!("expecting {} values, got {}", columns, record.len()),
            ))
        } else {
            decode(&CsvRow {
                record: &record,
                source,
                line,
            })
        };

        match decoded {
            Ok(row) => rows.push(row),
            Err(e) if header_allowed => debug!("Skipping header line {} of {}: {}", line, source, e),
            Err(e) => return Err(e),
        }
    }

    if rows.is_empty() {
        return Err(PaleoError::parse(
            source,
            0,
            "no valid delimited lines found",
        ));
    }
    Ok(rows)
}

/// Read `path` and decode it with [`decode_rows`].
pub fn decode_file<T, F, P>(path: P, columns: usize, decode: F) -> Result<Vec<T>>
where
    F: Fn(&CsvRow<'_>) -> Result<T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)?;
    decode_rows(&data, &path.display().to_string(), columns, decode)
}
