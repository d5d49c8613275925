//! Newhall approximation of sampled motion in the Chebyshev basis
//!
//! Given positions and velocities sampled at `n` uniformly spaced instants
//! over `[t_min, t_max]`, the approximation is the Chebyshev series of the
//! requested degree which:
//! - matches the position and velocity at both ends of the interval exactly
//! - fits the interior samples in the least-squares sense, with velocity
//!   residuals (expressed in normalized time) weighted by [`VELOCITY_WEIGHT`]
//!
//! The endpoint constraints make consecutive approximations join with
//! continuous position and velocity.
//!
//! Every polynomial meeting the constraints is the cubic Hermite interpolant
//! of the endpoints plus `(1 - x²)²·r(x)`, so the constrained problem reduces
//! to an unconstrained least-squares problem for `r`, solved by QR
//! decomposition. The result is converted to the Chebyshev basis by
//! interpolation at the Chebyshev–Lobatto nodes, which is exact for
//! polynomials of the fitted degree.

use crate::numerics::chebyshev::{chebyshev_t, chebyshev_t_derivative, ChebyshevSeries};
use crate::numerics::{NumericsError, Result};
use crate::time::Instant;
use log::trace;
use nalgebra::{DMatrix, Vector3};
use std::f64::consts::PI;

/// Relative weight of the velocity residuals in the least-squares fit
pub const VELOCITY_WEIGHT: f64 = 0.4;

/// A Chebyshev series fitted to samples, with its estimated error
#[derive(Debug, Clone)]
pub struct NewhallApproximation {
    pub series: ChebyshevSeries,
    /// Largest distance between the series and the sampled positions
    pub sample_error: f64,
    /// Bound on the deviation from the samples, including the magnitude of
    /// the last coefficient as an estimate of the truncation error between
    /// samples
    pub error_estimate: f64,
}

/// Cubic matching values and derivatives (with respect to x) at x = ±1
struct EndpointCubic {
    p_minus: Vector3<f64>,
    p_plus: Vector3<f64>,
    d_minus: Vector3<f64>,
    d_plus: Vector3<f64>,
}

impl EndpointCubic {
    fn value(&self, x: f64) -> Vector3<f64> {
        let s = (x + 1.0) / 2.0;
        let s2 = s * s;
        let s3 = s2 * s;
        self.p_minus * (2.0 * s3 - 3.0 * s2 + 1.0)
            + self.d_minus * (2.0 * (s3 - 2.0 * s2 + s))
            + self.p_plus * (-2.0 * s3 + 3.0 * s2)
            + self.d_plus * (2.0 * (s3 - s2))
    }

    fn derivative(&self, x: f64) -> Vector3<f64> {
        let s = (x + 1.0) / 2.0;
        let s2 = s * s;
        (self.p_minus * (6.0 * s2 - 6.0 * s)
            + self.d_minus * (2.0 * (3.0 * s2 - 4.0 * s + 1.0))
            + self.p_plus * (-6.0 * s2 + 6.0 * s)
            + self.d_plus * (2.0 * (3.0 * s2 - 2.0 * s)))
            / 2.0
    }
}

/// `(1 - x²)²·Tⱼ(x)` and its derivative
fn bubble(j: usize, x: f64) -> (f64, f64) {
    let w = 1.0 - x * x;
    let t = chebyshev_t(j, x);
    (
        w * w * t,
        -4.0 * x * w * t + w * w * chebyshev_t_derivative(j, x),
    )
}

/// Fit a Chebyshev series of the given degree to positions `q` and velocities
/// `v` sampled uniformly over `[t_min, t_max]`
///
/// # Panics
///
/// Panics if `q` and `v` differ in length, if fewer than two samples are
/// given, if `degree < 3` or `degree + 1 > 2 * q.len()`, or if
/// `t_min >= t_max`.
pub fn newhall_approximation_in_chebyshev_basis(
    degree: usize,
    q: &[Vector3<f64>],
    v: &[Vector3<f64>],
    t_min: Instant,
    t_max: Instant,
) -> Result<NewhallApproximation> {
    let n = q.len();
    assert_eq!(n, v.len(), "as many positions as velocities are required");
    assert!(n >= 2, "at least two samples are required, got {n}");
    assert!(
        degree >= 3 && degree < 2 * n,
        "degree {degree} cannot be fitted to {n} samples"
    );
    assert!(t_min < t_max, "invalid fitting interval [{t_min}, {t_max}]");

    let half_width = (t_max - t_min) / 2.0;
    let normalized_times: Vec<f64> = (0..n)
        .map(|i| -1.0 + 2.0 * i as f64 / (n - 1) as f64)
        .collect();

    // Positions are fitted relative to the first sample, which keeps the
    // problem well scaled for bodies far from the origin.
    let origin = q[0];
    let cubic = EndpointCubic {
        p_minus: Vector3::zeros(),
        p_plus: q[n - 1] - origin,
        d_minus: v[0] * half_width,
        d_plus: v[n - 1] * half_width,
    };

    // Least squares for the bubble coefficients over the interior samples.
    let unknowns = degree - 3;
    let interior = n - 2;
    let mut bubble_coefficients = vec![Vector3::zeros(); unknowns];
    if unknowns > 0 {
        let design = DMatrix::from_fn(2 * interior, unknowns, |row, j| {
            if row < interior {
                bubble(j, normalized_times[row + 1]).0
            } else {
                VELOCITY_WEIGHT * bubble(j, normalized_times[row - interior + 1]).1
            }
        });
        let residuals = DMatrix::from_fn(2 * interior, 3, |row, axis| {
            if row < interior {
                let i = row + 1;
                q[i][axis] - origin[axis] - cubic.value(normalized_times[i])[axis]
            } else {
                let i = row - interior + 1;
                VELOCITY_WEIGHT
                    * (half_width * v[i][axis] - cubic.derivative(normalized_times[i])[axis])
            }
        });

        let qr = design.qr();
        let projected = qr.q().transpose() * residuals;
        let solution = qr
            .r()
            .solve_upper_triangular(&projected)
            .ok_or(NumericsError::SingularSystem { degree })?;
        for (j, coefficient) in bubble_coefficients.iter_mut().enumerate() {
            *coefficient = Vector3::new(solution[(j, 0)], solution[(j, 1)], solution[(j, 2)]);
        }
    }

    let fitted = |x: f64| -> Vector3<f64> {
        bubble_coefficients
            .iter()
            .enumerate()
            .fold(cubic.value(x), |sum, (j, y)| sum + y * bubble(j, x).0)
    };

    // Chebyshev–Lobatto interpolation of the fitted polynomial.
    let nodes: Vec<Vector3<f64>> = (0..=degree)
        .map(|k| fitted((PI * k as f64 / degree as f64).cos()))
        .collect();
    let coefficients: Vec<Vector3<f64>> = (0..=degree)
        .map(|j| {
            let sum = nodes
                .iter()
                .enumerate()
                .fold(Vector3::zeros(), |sum, (k, f_k)| {
                    let endpoint_factor = if k == 0 || k == degree { 0.5 } else { 1.0 };
                    let t_jk = (PI * (j * k) as f64 / degree as f64).cos();
                    sum + f_k * (endpoint_factor * t_jk)
                });
            let factor = if j == 0 || j == degree { 1.0 } else { 2.0 };
            let c = sum * (factor / degree as f64);
            if j == 0 {
                c + origin
            } else {
                c
            }
        })
        .collect();
    if coefficients
        .iter()
        .any(|c| !(c.x.is_finite() && c.y.is_finite() && c.z.is_finite()))
    {
        return Err(NumericsError::SingularSystem { degree });
    }

    let series = ChebyshevSeries::new(coefficients, t_min, t_max);
    let sample_error = normalized_times
        .iter()
        .zip(q)
        .map(|(&x, q_i)| (series.evaluate_normalized(x) - q_i).norm())
        .fold(0.0, f64::max);
    let truncation_error = series.coefficients()[degree].norm();
    let error_estimate = sample_error.max(truncation_error);
    trace!(
        "Newhall degree {degree} over [{t_min}, {t_max}]: sample error {sample_error:e} m, estimate {error_estimate:e} m"
    );

    Ok(NewhallApproximation {
        series,
        sample_error,
        error_estimate,
    })
}
