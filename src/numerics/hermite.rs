//! Two-point cubic Hermite interpolation

use crate::time::Instant;
use nalgebra::Vector3;

/// The cubic matching values and derivatives at two instants
#[derive(Debug, Clone, Copy)]
pub struct Hermite3 {
    t0: Instant,
    t1: Instant,
    p0: Vector3<f64>,
    p1: Vector3<f64>,
    v0: Vector3<f64>,
    v1: Vector3<f64>,
}

impl Hermite3 {
    /// Create the interpolant through `(t0, p0, v0)` and `(t1, p1, v1)`
    ///
    /// # Panics
    ///
    /// Panics unless `t0 < t1`.
    pub fn new(
        arguments: (Instant, Instant),
        values: (Vector3<f64>, Vector3<f64>),
        derivatives: (Vector3<f64>, Vector3<f64>),
    ) -> Self {
        let (t0, t1) = arguments;
        assert!(t0 < t1, "Hermite interpolation needs t0 < t1, got {t0} and {t1}");
        Self {
            t0,
            t1,
            p0: values.0,
            p1: values.1,
            v0: derivatives.0,
            v1: derivatives.1,
        }
    }

    pub fn evaluate(&self, t: Instant) -> Vector3<f64> {
        let h = self.t1 - self.t0;
        let s = (t - self.t0) / h;
        let s2 = s * s;
        let s3 = s2 * s;
        self.p0 * (2.0 * s3 - 3.0 * s2 + 1.0)
            + self.v0 * (h * (s3 - 2.0 * s2 + s))
            + self.p1 * (-2.0 * s3 + 3.0 * s2)
            + self.v1 * (h * (s3 - s2))
    }

    pub fn evaluate_derivative(&self, t: Instant) -> Vector3<f64> {
        let h = self.t1 - self.t0;
        let s = (t - self.t0) / h;
        let s2 = s * s;
        (self.p1 - self.p0) * ((6.0 * s - 6.0 * s2) / h)
            + self.v0 * (3.0 * s2 - 4.0 * s + 1.0)
            + self.v1 * (3.0 * s2 - 2.0 * s)
    }

    /// Largest distance between the interpolant and the given samples
    pub fn l_infinity_error<S>(
        &self,
        samples: &[S],
        get_argument: impl Fn(&S) -> Instant,
        get_value: impl Fn(&S) -> Vector3<f64>,
    ) -> f64 {
        samples
            .iter()
            .map(|sample| (self.evaluate(get_argument(sample)) - get_value(sample)).norm())
            .fold(0.0, f64::max)
    }
}
