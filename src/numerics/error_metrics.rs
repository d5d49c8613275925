//! Error measures used to compare computed and expected quantities

use nalgebra::Vector3;
use std::ops::Sub;

/// Quantities with a norm, for which errors are defined
pub trait Normed: Copy + Sub<Output = Self> {
    fn norm_value(&self) -> f64;
}

impl Normed for f64 {
    fn norm_value(&self) -> f64 {
        self.abs()
    }
}

impl Normed for Vector3<f64> {
    fn norm_value(&self) -> f64 {
        self.magnitude()
    }
}

/// Number of representable doubles between `x` and `y`
///
/// Zero for equal values, including `0.0` and `-0.0`.
pub fn ulp_distance(x: f64, y: f64) -> u64 {
    fn ordinal(value: f64) -> i128 {
        let bits = value.to_bits() as i64;
        if bits < 0 {
            (i64::MIN as i128) - bits as i128
        } else {
            bits as i128
        }
    }
    (ordinal(x) - ordinal(y)).unsigned_abs() as u64
}

/// Norm of the difference between `expected` and `actual`
pub fn absolute_error<T: Normed>(expected: T, actual: T) -> f64 {
    (expected - actual).norm_value()
}

/// Absolute error divided by the norm of `expected`
pub fn relative_error<T: Normed>(expected: T, actual: T) -> f64 {
    absolute_error(expected, actual) / expected.norm_value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ulp_distance() {
        assert_eq!(ulp_distance(1.0, 1.0), 0);
        assert_eq!(ulp_distance(0.0, -0.0), 0);
        assert_eq!(ulp_distance(1.0, 1.0 + f64::EPSILON), 1);
        assert_eq!(ulp_distance(-1.0, -1.0 - f64::EPSILON), 1);
        assert_eq!(ulp_distance(0.0, f64::from_bits(1)), 1);
        assert_eq!(ulp_distance(-f64::from_bits(1), f64::from_bits(1)), 2);
        assert_eq!(ulp_distance(0.0, f64::MIN_POSITIVE), 1 << 52);
    }

    #[test]
    fn test_absolute_and_relative_errors() {
        assert_eq!(absolute_error(2.0, 1.5), 0.5);
        assert_eq!(relative_error(2.0, 1.5), 0.25);

        let expected = Vector3::new(3.0, 4.0, 0.0);
        let actual = Vector3::new(3.0, 4.0, 1.0);
        assert_eq!(absolute_error(expected, actual), 1.0);
        assert_eq!(relative_error(expected, actual), 0.2);
    }
}
