//! Partition of densely sampled data into cubic Hermite intervals

use crate::numerics::hermite::Hermite3;
use crate::time::Instant;
use nalgebra::Vector3;

/// Split `samples` into intervals over which the cubic Hermite interpolant of
/// the interval endpoints stays within `tolerance` of every sample
///
/// Returns the indices at which the intervals end, in increasing order,
/// excluding the final interval which ends at the last sample. The result is
/// empty when fewer than three samples are given or when a single cubic fits
/// the whole input. Intervals are grown greedily from the front: each
/// breakpoint is found by bisection as the largest index for which the
/// interval starting at the previous breakpoint still fits.
///
/// # Panics
///
/// Panics unless `tolerance > 0`.
pub fn fit_hermite_spline<S, A, V, D>(
    samples: &[S],
    get_argument: A,
    get_value: V,
    get_derivative: D,
    tolerance: f64,
) -> Vec<usize>
where
    A: Fn(&S) -> Instant,
    V: Fn(&S) -> Vector3<f64>,
    D: Fn(&S) -> Vector3<f64>,
{
    assert!(tolerance > 0.0, "fitting tolerance must be positive, got {tolerance}");

    let fits = |begin: usize, end: usize| -> bool {
        let first = &samples[begin];
        let last = &samples[end];
        let hermite = Hermite3::new(
            (get_argument(first), get_argument(last)),
            (get_value(first), get_value(last)),
            (get_derivative(first), get_derivative(last)),
        );
        hermite.l_infinity_error(&samples[begin..=end], &get_argument, &get_value) < tolerance
    };

    let n = samples.len();
    let mut breakpoints = Vec::new();
    let mut begin = 0;
    while n - begin >= 3 && !fits(begin, n - 1) {
        // Invariant: [begin, lower] fits and [begin, upper] does not.
        let mut lower = begin + 1;
        let mut upper = n - 1;
        while upper - lower > 1 {
            let middle = lower + (upper - lower) / 2;
            if fits(begin, middle) {
                lower = middle;
            } else {
                upper = middle;
            }
        }
        breakpoints.push(lower);
        begin = lower;
    }
    breakpoints
}
