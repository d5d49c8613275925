//! Scalar equation solvers

use num_traits::Float;
use std::fmt::Debug;

/// Approximates a root of `f` between `lower_bound` and `upper_bound` by bisection
///
/// The result is less than one ULP from a root of any continuous function
/// agreeing with `f` on the values of `A`. The bounds may be given in either
/// order.
///
/// # Panics
///
/// Panics if `f(lower_bound)` or `f(upper_bound)` is zero, or if they have the
/// same sign.
pub fn bisect<A, V, F>(f: F, lower_bound: A, upper_bound: A) -> A
where
    A: Float + Debug,
    V: Float + Debug,
    F: Fn(A) -> V,
{
    let f_lower = f(lower_bound);
    let f_upper = f(upper_bound);
    assert!(
        f_lower != V::zero() && f_upper != V::zero(),
        "bisect: f({lower_bound:?}) = {f_lower:?} and f({upper_bound:?}) = {f_upper:?} must be nonzero"
    );
    assert!(
        (f_lower < V::zero()) != (f_upper < V::zero()),
        "bisect: f({lower_bound:?}) = {f_lower:?} and f({upper_bound:?}) = {f_upper:?} have the same sign"
    );

    let two = A::one() + A::one();
    let lower_is_negative = f_lower < V::zero();
    let mut lower = lower_bound;
    let mut upper = upper_bound;
    loop {
        let half_width = (upper - lower) / two;
        let middle = if half_width.is_finite() {
            lower + half_width
        } else {
            lower / two + upper / two
        };
        if middle == lower || middle == upper {
            return middle;
        }
        let f_middle = f(middle);
        if f_middle == V::zero() {
            return middle;
        }
        if (f_middle < V::zero()) == lower_is_negative {
            lower = middle;
        } else {
            upper = middle;
        }
    }
}

/// Returns the real solutions of `a2·x² + a1·x + a0 = 0` in increasing order
///
/// The result has 0, 1 or 2 values: none for a negative discriminant, a
/// double root for a zero discriminant, two roots otherwise. The roots are
/// computed as `q / a2` and `a0 / q` with `q = -(a1 + sign(a1)·√Δ) / 2`,
/// which avoids cancellation when `a1` dominates. A vanishing `a2` degrades
/// to the linear equation.
pub fn solve_quadratic_equation(a2: f64, a1: f64, a0: f64) -> Vec<f64> {
    if a2 == 0.0 {
        if a1 == 0.0 {
            return Vec::new();
        }
        return vec![-a0 / a1];
    }

    let discriminant = a1 * a1 - 4.0 * a0 * a2;
    if discriminant == 0.0 {
        vec![-a1 / (2.0 * a2)]
    } else if discriminant < 0.0 {
        Vec::new()
    } else {
        let q = -0.5 * (a1 + a1.signum() * discriminant.sqrt());
        let x1 = q / a2;
        let x2 = a0 / q;
        if x1 < x2 {
            vec![x1, x2]
        } else if x2 < x1 {
            vec![x2, x1]
        } else {
            vec![x1]
        }
    }
}
