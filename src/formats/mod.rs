//! Readers for the reference data files.
//!
//! - [`csv`]: Euler rotation and polar wander path tables
//! - [`gpml`]: GPlates markup plate polygons
//! - [`kml`]: Google Earth plate polygons

pub mod csv;
pub mod gpml;
pub mod kml;

/// Local names of the currently open XML elements, outermost first.
#[derive(Debug, Default)]
pub(crate) struct ElementStack {
    names: Vec<String>,
}

impl ElementStack {
    pub fn push(&mut self, local_name: &[u8]) {
        self.names
            .push(String::from_utf8_lossy(local_name).into_owned());
    }

    pub fn pop(&mut self) {
        self.names.pop();
    }

    /// The innermost open elements match `path`, e.g. `["LinearRing", "coordinates"]`.
    pub fn ends_with(&self, path: &[&str]) -> bool {
        self.names.len() >= path.len()
            && self.names[self.names.len() - path.len()..]
                .iter()
                .zip(path)
                .all(|(a, b)| a == b)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// 1-based line number of byte `offset` in `data`.
pub(crate) fn line_at(data: &str, offset: usize) -> usize {
    let end = offset.min(data.len());
    data.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
