//! Spherical trigonometry for pole reconstruction.
//!
//! The pipeline for a single age is:
//!
//! 1. [`rotate_pole`]: rotate the reference plate's paleomagnetic pole through the
//!    Euler rotation of the site's plate, giving the pole as seen from that plate.
//! 2. [`paleolatitude`]: angular distance between the site and the rotated pole,
//!    expressed as a latitude.
//! 3. [`uncertainty_bounds`]: propagate the pole's A95 confidence radius through
//!    the geomagnetic inclination, then [`correct_pole_crossing`] when a bound
//!    swept over a geographic pole.
//!
//! All angles at the API boundary are in degrees.

use tracing::debug;

use crate::coordinate::Coordinate;
use crate::error::{PaleoError, Result};
use crate::{Matrix3, Vector3};

/// Marker for a latitude that could not be computed (e.g. bounds without A95 data).
pub const INVALID_LATITUDE: f64 = -99999.0;

/// A95 values at or below this are treated as "no uncertainty data".
pub const MIN_A95: f64 = 0.0000001;

const DOUBLE_COMPARISON_EPSILON: f64 = 0.0000000001;

pub fn deg2rad(deg: f64) -> f64 {
    (deg * std::f64::consts::PI) / 180.0
}

pub fn rad2deg(rad: f64) -> f64 {
    rad * (180.0 / std::f64::consts::PI)
}

/// `true` for latitudes inside [-90, 90]; the sentinel and NaN are both invalid.
pub fn is_valid_latitude(latitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude)
}

/// Equality within an absolute or relative tolerance of 1e-10.
pub fn approx_eq(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let diff = (a - b).abs();
    if diff <= DOUBLE_COMPARISON_EPSILON {
        return true;
    }
    diff / (a.abs() + b.abs()) < DOUBLE_COMPARISON_EPSILON
}

/// Rotation of a plate about an Euler pole by `angle` degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerRotation {
    pub pole: Coordinate,
    pub angle: f64,
}

impl EulerRotation {
    pub fn new(pole: Coordinate, angle: f64) -> Self {
        Self { pole, angle }
    }

    /// Local basis at the Euler pole, columns (θ̂, φ̂, r̂).
    ///
    /// Each axis is checked for unit norm; a failure means the trigonometry
    /// above is broken, not that the input was bad.
    fn basis(&self) -> Result<Matrix3> {
        let theta = deg2rad(90.0 - self.pole.latitude);
        let phi = deg2rad(self.pole.longitude);
        let (theta_sin, theta_cos) = theta.sin_cos();
        let (phi_sin, phi_cos) = phi.sin_cos();

        let vec_theta = Vector3::new(phi_cos * theta_cos, phi_sin * theta_cos, -theta_sin);
        let vec_phi = Vector3::new(-phi_sin, phi_cos, 0.0);
        let vec_r = Vector3::new(phi_cos * theta_sin, phi_sin * theta_sin, theta_cos);

        for (name, v) in [("θ_E", &vec_theta), ("φ_E", &vec_phi), ("r_E", &vec_r)] {
            let norm = v.norm();
            if !approx_eq(norm, 1.0) {
                return Err(PaleoError::GeometryConsistency(format!(
                    "norm of {} basis vector is {}, expected 1",
                    name, norm
                )));
            }
        }

        Ok(Matrix3::from_columns(&[vec_theta, vec_phi, vec_r]))
    }
}

/// Rotate `pole` through `euler`: `L · R(-ω) · Lᵀ · xyz`.
///
/// The returned longitude lies in [0, 360).
pub fn rotate_pole(pole: &Coordinate, euler: &EulerRotation) -> Result<Coordinate> {
    let l = euler.basis()?;
    let (w_sin, w_cos) = deg2rad(-euler.angle).sin_cos();
    #[rustfmt::skip]
    let r = Matrix3::new(
        w_cos, -w_sin, 0.0,
        w_sin,  w_cos, 0.0,
        0.0,    0.0,   1.0,
    );

    let theta_p = deg2rad(90.0 - pole.latitude);
    let phi_p = deg2rad(pole.longitude);
    let xyz = Vector3::new(
        phi_p.cos() * theta_p.sin(),
        phi_p.sin() * theta_p.sin(),
        theta_p.cos(),
    );

    let rotated = l * r * l.transpose() * xyz;
    let (x, y, z) = (rotated.x, rotated.y, rotated.z);

    let phi_rot = if x == 0.0 && y == 0.0 {
        // Exactly on the axis; longitude is arbitrary.
        0.0
    } else {
        let mut phi = (y / x).atan();
        if x < 0.0 {
            phi += std::f64::consts::PI;
        }
        if x >= 0.0 && y <= 0.0 {
            phi += 2.0 * std::f64::consts::PI;
        }
        phi
    };
    let theta_rot = z.clamp(-1.0, 1.0).acos();

    let out = Coordinate::new(90.0 - rad2deg(theta_rot), rad2deg(phi_rot));
    debug!("Rotated pole {} about {} by {} → {}", pole, euler.pole, euler.angle, out);
    Ok(out)
}

/// Latitude of `site` relative to the rotated paleomagnetic `pole`, in degrees.
pub fn paleolatitude(site: &Coordinate, pole: &Coordinate) -> f64 {
    let lambda_s = deg2rad(site.latitude);
    let lambda_p = deg2rad(pole.latitude);
    let numerator = (lambda_p.sin() * lambda_s.sin()
        + lambda_p.cos() * lambda_s.cos() * deg2rad(pole.longitude - site.longitude).cos())
    .clamp(-1.0, 1.0);
    let denominator = (1.0 - numerator.powi(2)).sqrt();
    rad2deg((numerator / denominator).atan())
}

/// Raw lower/upper paleolatitude for a pole with confidence radius `a95`.
///
/// Returns `None` when `a95` carries no uncertainty information. The bounds
/// are not corrected for pole crossings; see [`paleolatitude_bounds`].
pub fn uncertainty_bounds(palat: f64, a95: f64) -> Option<(f64, f64)> {
    if a95 <= MIN_A95 {
        return None;
    }
    let lambda = deg2rad(palat);
    let delta_i =
        deg2rad(a95 * 2.0 / (1.0 + 3.0 * (0.5 * std::f64::consts::PI - lambda).cos().powi(2)));

    // Dipole field: tan I = 2 tan λ
    let inclination = (2.0 * lambda.tan()).atan();

    let lambda_min = rad2deg((0.5 * (inclination - delta_i).tan()).atan());
    let lambda_max = rad2deg((0.5 * (inclination + delta_i).tan()).atan());
    Some((lambda_min, lambda_max))
}

/// Fold bounds that swept over a pole back onto the side of `palat`.
///
/// Only applies when a bound lies on the wrong side of `palat`
/// (`max < palat` or `min > palat`); otherwise the bounds are returned unchanged.
pub fn correct_pole_crossing(palat: f64, lambda_min: f64, lambda_max: f64) -> (f64, f64) {
    if !(lambda_max < palat || lambda_min > palat) {
        return (lambda_min, lambda_max);
    }
    let corrected = if palat < 0.0 {
        (-90.0, f64::max(-lambda_min.abs(), -lambda_max.abs()))
    } else {
        (f64::min(lambda_min.abs(), lambda_max.abs()), 90.0)
    };
    debug!(
        "Bounds [{}, {}] crossed a pole; corrected to [{}, {}]",
        lambda_min, lambda_max, corrected.0, corrected.1
    );
    corrected
}

/// Uncertainty bounds with pole-crossing correction, or the
/// [`INVALID_LATITUDE`] pair when `a95` is absent.
pub fn paleolatitude_bounds(palat: f64, a95: f64) -> (f64, f64) {
    match uncertainty_bounds(palat, a95) {
        Some((lo, hi)) => correct_pole_crossing(palat, lo, hi),
        None => (INVALID_LATITUDE, INVALID_LATITUDE),
    }
}
