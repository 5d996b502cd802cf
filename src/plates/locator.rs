//! Point-in-plate tests on the sphere.
//!
//! A single ray cast is unreliable near the poles and the date line, so each
//! test shoots great-circle rays from the site to a set of anchor targets
//! spread over different plates, and lets the rays vote. A ray votes
//! "inside" when it crosses the plate boundary an odd number of times. The
//! anchor that happens to sit on the tested plate casts one wrong vote, so a
//! clear majority is required either way; anything in between is reported as
//! indeterminate rather than guessed.
//!
//! Cost is O(anchors × polygon edges) per point, and nested-plate checks
//! repeat that for every vertex of the inner plate. This is fine for single
//! site queries; bulk lookups would want a spatial index first.

use tracing::debug;

use crate::coordinate::Coordinate;
use crate::error::{PaleoError, Result};
use crate::Vector3;

use super::Plate;

const EPS: f64 = 1e-12;
const DEGENERATE: f64 = 1e-15;

/// Tuning for the ray-voting containment test.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Ray end points, each chosen to lie on a different major plate.
    pub ray_targets: Vec<Coordinate>,
    /// A side wins when its votes exceed `vote_ratio` × the other side's.
    pub vote_ratio: usize,
    /// Fraction of an inner plate's vertices that must lie inside an outer
    /// plate for the inner plate to count as nested.
    pub nested_fraction: f64,
    /// Polygon edges spanning more than this many degrees of longitude are
    /// taken to wrap the antimeridian and are skipped.
    pub max_edge_longitude_span: f64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            ray_targets: vec![
                Coordinate::new(89.0, 0.0),                // north pole, North America
                Coordinate::new(-89.0, 0.0),               // south pole, East Antarctica
                Coordinate::new(-18.933333, 47.516667),    // Antananarivo, Madagascar
                Coordinate::new(21.3, -157.816667),        // Honolulu, Pacific
                Coordinate::new(64.175, -51.738889),       // Nuuk, Greenland
                Coordinate::new(9.06, 7.47),               // Abuja, Africa
                Coordinate::new(51.5, -0.1),               // London, Eurasia
                Coordinate::new(-33.8, 151.2),             // Sydney, Australia
                Coordinate::new(45.0, -93.25),             // Minneapolis, North America
                Coordinate::new(-22.9, -42.2),             // Rio de Janeiro, South America
                Coordinate::new(14.75, -17.45),            // Dakar, NW Africa
                Coordinate::new(22.3, 114.16),             // Hong Kong
            ],
            vote_ratio: 2,
            nested_fraction: 0.9,
            max_edge_longitude_span: 270.0,
        }
    }
}

/// Ray votes for one point against one plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayVotes {
    pub inside: usize,
    pub outside: usize,
}

impl RayVotes {
    /// `Some(true)` / `Some(false)` for a clear majority, `None` when indeterminate.
    pub fn verdict(&self, ratio: usize) -> Option<bool> {
        if self.inside > ratio * self.outside {
            Some(true)
        } else if self.outside > ratio * self.inside {
            Some(false)
        } else {
            None
        }
    }
}

/// `true` when `p` lies on the minor arc a→b of the great circle with normal `n = a × b`.
fn on_arc(p: &Vector3, a: &Vector3, b: &Vector3, n: &Vector3) -> bool {
    a.cross(p).dot(n) >= -EPS && p.cross(b).dot(n) >= -EPS
}

/// Whether great-circle arcs a→b and c→d intersect.
pub fn arcs_intersect(a: &Vector3, b: &Vector3, c: &Vector3, d: &Vector3) -> bool {
    let n1 = a.cross(b);
    let n2 = c.cross(d);
    if n1.norm() < DEGENERATE || n2.norm() < DEGENERATE {
        return false;
    }

    let t = n1.cross(&n2);
    let t_norm = t.norm();
    if t_norm < DEGENERATE {
        // Same great circle: overlap if any end point lies on the other arc
        return on_arc(c, a, b, &n1)
            || on_arc(d, a, b, &n1)
            || on_arc(a, c, d, &n2)
            || on_arc(b, c, d, &n2);
    }

    let p = t / t_norm;
    [p, -p]
        .iter()
        .any(|q| on_arc(q, a, b, &n1) && on_arc(q, c, d, &n2))
}

/// Cast every ray from `point` and count boundary crossings.
pub fn ray_votes(plate: &Plate, point: &Coordinate, config: &LocatorConfig) -> RayVotes {
    let site = point.uvec();
    let edges: Vec<(Vector3, Vector3)> = plate
        .edges()
        .filter(|(curr, next)| {
            (curr.longitude - next.longitude).abs() <= config.max_edge_longitude_span
        })
        .map(|(curr, next)| (curr.uvec(), next.uvec()))
        .collect();

    let mut votes = RayVotes {
        inside: 0,
        outside: 0,
    };
    for target in &config.ray_targets {
        let target = target.uvec();
        let crossings = edges
            .iter()
            .filter(|(c, d)| arcs_intersect(&site, &target, c, d))
            .count();
        if crossings % 2 == 1 {
            votes.inside += 1;
        } else {
            votes.outside += 1;
        }
    }
    votes
}

/// Whether `plate` contains `point`.
///
/// Fails with [`PaleoError::IndeterminateLocation`] when the ray vote is not
/// decisive, which in practice means the point sits on the plate boundary.
pub fn plate_contains(plate: &Plate, point: &Coordinate, config: &LocatorConfig) -> Result<bool> {
    let votes = ray_votes(plate, point, config);
    votes
        .verdict(config.vote_ratio)
        .ok_or_else(|| PaleoError::IndeterminateLocation {
            plate: plate.label(),
            point: point.to_string(),
            inside: votes.inside,
            outside: votes.outside,
        })
}

/// Whether `inner` lies (almost) entirely within `outer`.
///
/// Counts the fraction of `inner`'s vertices inside `outer`; vertices whose
/// vote is indeterminate count as outside.
pub fn plate_fully_contains(outer: &Plate, inner: &Plate, config: &LocatorConfig) -> bool {
    if inner.polygon.is_empty() {
        return false;
    }
    let inside = inner
        .polygon
        .iter()
        .filter(|v| {
            ray_votes(outer, v, config).verdict(config.vote_ratio) == Some(true)
        })
        .count();
    let fraction = inside as f64 / inner.polygon.len() as f64;
    debug!(
        "{:.0}% of {} lies within {}",
        fraction * 100.0,
        inner.label(),
        outer.label()
    );
    fraction > config.nested_fraction
}

/// The plate containing `site`, preferring the innermost of nested plates.
pub fn find_plate<'a>(
    plates: &'a [Plate],
    site: &Coordinate,
    config: &LocatorConfig,
) -> Result<&'a Plate> {
    let mut found: Option<&Plate> = None;

    for plate in plates {
        if !plate_contains(plate, site, config)? {
            continue;
        }
        debug!("Site {} lies within {}", site, plate.label());
        found = match found {
            None => Some(plate),
            Some(prev) if plate_fully_contains(prev, plate, config) => Some(plate),
            Some(prev) if plate_fully_contains(plate, prev, config) => Some(prev),
            Some(prev) => {
                return Err(PaleoError::AmbiguousLocation {
                    first: prev.label(),
                    second: plate.label(),
                })
            }
        };
    }

    found.ok_or_else(|| PaleoError::not_found("Plate", format!("no plate contains site {}", site)))
}
