//! Chebyshev series for trajectory interpolation
//!
//! A [`ChebyshevSeries`] represents a vector-valued polynomial over a closed
//! time interval `[t_min, t_max]`:
//!
//! p(t) = c₀·T₀(x) + c₁·T₁(x) + ... + cₙ·Tₙ(x),  x = (t - t_mid) / h
//!
//! where `h` is the half-width of the interval. Chebyshev series offer
//! excellent approximation properties for smooth trajectories, and the
//! magnitude of the last coefficient is a good estimate of the truncation
//! error.

use crate::time::Instant;
use nalgebra::Vector3;

/// A vector-valued Chebyshev series over a time interval
#[derive(Debug, Clone)]
pub struct ChebyshevSeries {
    /// Coefficients, ordered from lowest to highest degree
    coefficients: Vec<Vector3<f64>>,
    t_min: Instant,
    t_max: Instant,
    t_mid: Instant,
    half_width: f64,
}

impl ChebyshevSeries {
    /// Create a new series with the given coefficients over `[t_min, t_max]`
    ///
    /// # Panics
    ///
    /// Panics if `coefficients` is empty or if `t_min >= t_max`.
    pub fn new(coefficients: Vec<Vector3<f64>>, t_min: Instant, t_max: Instant) -> Self {
        assert!(
            !coefficients.is_empty(),
            "a Chebyshev series needs at least one coefficient"
        );
        assert!(
            t_min < t_max,
            "invalid Chebyshev series interval [{t_min}, {t_max}]"
        );
        Self {
            coefficients,
            t_min,
            t_max,
            t_mid: t_min.midpoint(t_max),
            half_width: (t_max - t_min) / 2.0,
        }
    }

    pub fn t_min(&self) -> Instant {
        self.t_min
    }

    pub fn t_max(&self) -> Instant {
        self.t_max
    }

    /// Get the degree of the series
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Get a reference to the coefficients
    pub fn coefficients(&self) -> &[Vector3<f64>] {
        &self.coefficients
    }

    /// Normalize `t` to the range [-1, 1]
    pub fn normalize_time(&self, t: Instant) -> f64 {
        (t - self.t_mid) / self.half_width
    }

    /// Evaluate the series at `t`
    ///
    /// # Panics
    ///
    /// Panics if `t` is outside `[t_min, t_max]`.
    pub fn evaluate(&self, t: Instant) -> Vector3<f64> {
        self.check_in_range(t);
        self.evaluate_normalized(self.normalize_time(t).clamp(-1.0, 1.0))
    }

    /// Evaluate the time derivative of the series at `t`
    ///
    /// # Panics
    ///
    /// Panics if `t` is outside `[t_min, t_max]`.
    pub fn evaluate_derivative(&self, t: Instant) -> Vector3<f64> {
        self.check_in_range(t);
        self.evaluate_derivative_normalized(self.normalize_time(t).clamp(-1.0, 1.0))
            / self.half_width
    }

    /// Evaluate at a normalized time using Clenshaw's recurrence
    pub(crate) fn evaluate_normalized(&self, x: f64) -> Vector3<f64> {
        let mut b_k1 = Vector3::zeros();
        let mut b_k2 = Vector3::zeros();
        for c_k in self.coefficients.iter().skip(1).rev() {
            let b_k = c_k + b_k1 * (2.0 * x) - b_k2;
            b_k2 = b_k1;
            b_k1 = b_k;
        }
        self.coefficients[0] + b_k1 * x - b_k2
    }

    /// Derivative with respect to the normalized time
    ///
    /// dTₙ/dx = n·Uₙ₋₁(x), summed with Clenshaw's recurrence for the second kind.
    pub(crate) fn evaluate_derivative_normalized(&self, x: f64) -> Vector3<f64> {
        let mut b_k1 = Vector3::zeros();
        let mut b_k2 = Vector3::zeros();
        for (n, c_n) in self.coefficients.iter().enumerate().skip(1).rev() {
            let b_k = c_n * n as f64 + b_k1 * (2.0 * x) - b_k2;
            b_k2 = b_k1;
            b_k1 = b_k;
        }
        b_k1
    }

    fn check_in_range(&self, t: Instant) {
        assert!(
            self.t_min <= t && t <= self.t_max,
            "{t} is outside the Chebyshev series interval [{}, {}]",
            self.t_min,
            self.t_max
        );
    }
}

/// Compute the value of the Chebyshev polynomial Tₙ(x) of the first kind
pub fn chebyshev_t(n: usize, x: f64) -> f64 {
    match n {
        0 => 1.0,
        1 => x,
        _ => {
            // T_n(x) = 2x*T_{n-1}(x) - T_{n-2}(x)
            let mut t_prev2 = 1.0;
            let mut t_prev1 = x;
            let mut t_n = 0.0;
            for _ in 2..=n {
                t_n = 2.0 * x * t_prev1 - t_prev2;
                t_prev2 = t_prev1;
                t_prev1 = t_n;
            }
            t_n
        }
    }
}

/// Compute the value of the Chebyshev polynomial Uₙ(x) of the second kind
pub fn chebyshev_u(n: usize, x: f64) -> f64 {
    match n {
        0 => 1.0,
        1 => 2.0 * x,
        _ => {
            // U_n(x) = 2x*U_{n-1}(x) - U_{n-2}(x)
            let mut u_prev2 = 1.0;
            let mut u_prev1 = 2.0 * x;
            let mut u_n = 0.0;
            for _ in 2..=n {
                u_n = 2.0 * x * u_prev1 - u_prev2;
                u_prev2 = u_prev1;
                u_prev1 = u_n;
            }
            u_n
        }
    }
}

/// Derivative dTₙ/dx of the Chebyshev polynomial of the first kind
pub fn chebyshev_t_derivative(n: usize, x: f64) -> f64 {
    if n == 0 {
        0.0
    } else {
        n as f64 * chebyshev_u(n - 1, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scalar_series(coefficients: &[f64], t_min: f64, t_max: f64) -> ChebyshevSeries {
        ChebyshevSeries::new(
            coefficients
                .iter()
                .map(|&c| Vector3::new(c, -c, 2.0 * c))
                .collect(),
            Instant::from_seconds_since_j2000(t_min),
            Instant::from_seconds_since_j2000(t_max),
        )
    }

    fn at(seconds: f64) -> Instant {
        Instant::from_seconds_since_j2000(seconds)
    }

    #[test]
    fn test_chebyshev_constant() {
        let series = scalar_series(&[5.0], -1.0, 1.0);

        assert_eq!(series.evaluate(at(-1.0)).x, 5.0);
        assert_eq!(series.evaluate(at(0.0)).y, -5.0);
        assert_eq!(series.evaluate(at(1.0)).z, 10.0);
        assert_eq!(series.evaluate_derivative(at(0.0)), Vector3::zeros());
        assert_eq!(series.degree(), 0);
    }

    #[test]
    fn test_chebyshev_linear() {
        // 3 + 2x
        let series = scalar_series(&[3.0, 2.0], -1.0, 1.0);

        assert_eq!(series.evaluate(at(-1.0)).x, 1.0);
        assert_eq!(series.evaluate(at(0.0)).x, 3.0);
        assert_eq!(series.evaluate(at(1.0)).x, 5.0);
        assert_eq!(series.evaluate_derivative(at(-1.0)).x, 2.0);
        assert_eq!(series.evaluate_derivative(at(1.0)).x, 2.0);
    }

    #[test]
    fn test_chebyshev_quadratic() {
        // 3 + 2x + (2x² - 1) = 2 + 2x + 2x²
        let series = scalar_series(&[3.0, 2.0, 1.0], -1.0, 1.0);

        assert_eq!(series.evaluate(at(-1.0)).x, 2.0);
        assert_eq!(series.evaluate(at(0.0)).x, 2.0);
        assert_eq!(series.evaluate(at(1.0)).x, 6.0);

        // 2 + 4x
        assert_eq!(series.evaluate_derivative(at(-1.0)).x, -2.0);
        assert_eq!(series.evaluate_derivative(at(0.0)).x, 2.0);
        assert_eq!(series.evaluate_derivative(at(1.0)).x, 6.0);
    }

    #[test]
    fn test_time_normalization() {
        let series = scalar_series(&[1.0, 1.0], 90.0, 110.0);

        assert_eq!(series.normalize_time(at(100.0)), 0.0);
        assert_eq!(series.normalize_time(at(90.0)), -1.0);
        assert_eq!(series.normalize_time(at(110.0)), 1.0);
        assert_eq!(series.normalize_time(at(95.0)), -0.5);
    }

    #[test]
    fn test_derivative_rescaling() {
        // x = (t - 100) / 10, so d/dt (5x) = 0.5
        let series = scalar_series(&[0.0, 5.0], 90.0, 110.0);
        assert_relative_eq!(series.evaluate_derivative(at(97.0)).x, 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_clenshaw_matches_direct_summation() {
        let coefficients = [1.0, -2.0, 0.5, 3.0, -0.25, 0.125];
        let series = scalar_series(&coefficients, -1.0, 1.0);
        for i in 0..=20 {
            let x = -1.0 + i as f64 * 0.1;
            let direct: f64 = coefficients
                .iter()
                .enumerate()
                .map(|(n, c)| c * chebyshev_t(n, x))
                .sum();
            let direct_derivative: f64 = coefficients
                .iter()
                .enumerate()
                .map(|(n, c)| c * chebyshev_t_derivative(n, x))
                .sum();
            assert_relative_eq!(series.evaluate_normalized(x).x, direct, epsilon = 1e-12);
            assert_relative_eq!(
                series.evaluate_derivative_normalized(x).x,
                direct_derivative,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_approximation_accuracy() {
        // x² = (T₂(x) + 1) / 2
        let series = scalar_series(&[0.5, 0.0, 0.5], -1.0, 1.0);
        for i in 0..=10 {
            let x = -1.0 + i as f64 * 0.2;
            assert_relative_eq!(series.evaluate(at(x)).x, x * x, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_endpoint_values() {
        for n in 0..10 {
            let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
            assert_eq!(chebyshev_t(n, 1.0), 1.0);
            assert_eq!(chebyshev_t(n, -1.0), sign);
            assert_eq!(chebyshev_t_derivative(n, 1.0), (n * n) as f64);
            assert_eq!(chebyshev_t_derivative(n, -1.0), -sign * (n * n) as f64);
        }
    }

    #[test]
    #[should_panic(expected = "outside the Chebyshev series interval")]
    fn test_evaluate_out_of_range() {
        let series = scalar_series(&[1.0], 0.0, 10.0);
        series.evaluate(at(10.5));
    }
}
