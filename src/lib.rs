//! Orrery: continuous N-body ephemerides
//!
//! This crate integrates the motion of a set of massive bodies with a
//! fixed-step integrator and fits the results with piecewise Chebyshev
//! polynomials, so that positions and velocities can be queried at any
//! instant in the integrated range. Massless bodies can then be flowed in the
//! gravitational field of the ephemeris.
//!
//! # Main Components
//!
//! - [`physics::Ephemeris`]: lockstep integration of the massive bodies
//! - [`physics::ContinuousTrajectory`]: the fitted trajectory of one body
//! - [`physics::KeplerOrbit`]: closed-form two-body motion
//! - [`pile_up::PileUp`]: rigid groups of parts flowed in the ephemeris
//! - [`catalog`]: JSON catalogs and configuration, and a built-in solar system
//!
//! # Example
//!
//! ```no_run
//! use orrery::catalog::{solar_system, EphemerisParameters, SimulationConfig};
//! use orrery::constants::DAY_S;
//!
//! let config = SimulationConfig::new(solar_system()?, EphemerisParameters::default());
//! let mut ephemeris = config.build_ephemeris()?;
//! let t = ephemeris.t_min() + 30.0 * DAY_S;
//! ephemeris.prolong(t);
//! let earth = ephemeris.body_id("Earth").expect("Earth is in the catalog");
//! let position = ephemeris.trajectory(earth).evaluate_position(t);
//! println!("Earth at {position}");
//! # Ok::<(), orrery::OrreryError>(())
//! ```

use thiserror::Error;

pub mod catalog;
pub mod constants;
pub mod geometry;
pub mod integrators;
pub mod numerics;
pub mod physics;
pub mod pile_up;
pub mod time;

// Re-export commonly used types
pub use geometry::{DegreesOfFreedom, RelativeDegreesOfFreedom};
pub use physics::{Ephemeris, KeplerOrbit, MassiveBody};
pub use time::Instant;

/// Main error type for the orrery library
#[derive(Debug, Error)]
pub enum OrreryError {
    #[error("Ephemeris error: {0}")]
    Ephemeris(#[from] physics::EphemerisError),

    #[error("Kepler orbit error: {0}")]
    Kepler(#[from] physics::KeplerError),

    #[error("Numerics error: {0}")]
    Numerics(#[from] numerics::NumericsError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),
}

/// Result type for orrery operations
pub type Result<T> = std::result::Result<T, OrreryError>;
