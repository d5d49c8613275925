//! Numerical building blocks for trajectory fitting and orbit solving
//!
//! # Main Components
//!
//! - `root_finders`: bisection and quadratic equations
//! - `chebyshev`: Chebyshev series of vectors over a time interval
//! - `newhall`: Newhall approximation of positions and velocities in the Chebyshev basis
//! - `hermite`: two-point cubic Hermite interpolation
//! - `fit_hermite_spline`: adaptive partition of densely sampled data into Hermite intervals
//! - `error_metrics`: ULP distance and absolute/relative errors

pub mod chebyshev;
pub mod error_metrics;
pub mod fit_hermite_spline;
pub mod hermite;
pub mod newhall;
pub mod root_finders;

use thiserror::Error;

pub use self::chebyshev::ChebyshevSeries;
pub use self::fit_hermite_spline::fit_hermite_spline;
pub use self::hermite::Hermite3;
pub use self::newhall::{newhall_approximation_in_chebyshev_basis, NewhallApproximation};
pub use self::root_finders::{bisect, solve_quadratic_equation};

/// Error type for numerical fits
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NumericsError {
    /// The constrained least-squares system of a fit could not be solved
    #[error("Singular system for a Newhall approximation of degree {degree}")]
    SingularSystem {
        /// Degree of the requested approximation
        degree: usize,
    },
}

/// Result type for numerical fits
pub type Result<T> = std::result::Result<T, NumericsError>;
