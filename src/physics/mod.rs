//! Physics module: bodies, trajectories and the ephemeris
//!
//! # Main Components
//!
//! - [`MassiveBody`]: a body with a gravitational parameter
//! - [`DiscreteTrajectory`]: time-ordered samples of a massless body
//! - [`ContinuousTrajectory`]: piecewise Chebyshev fit of a massive body
//! - [`Ephemeris`]: lockstep integration of all the massive bodies, and flows
//!   of massless bodies in their field
//! - [`KeplerOrbit`]: closed-form two-body motion

pub mod continuous_trajectory;
pub mod discrete_trajectory;
pub mod ephemeris;
pub mod kepler_orbit;
pub mod massive_body;

pub use self::continuous_trajectory::{
    ContinuousTrajectory, FittingTolerance, FittingTolerances, PolynomialPiece,
};
pub use self::discrete_trajectory::{DiscreteTrajectory, TrajectoryPoint};
pub use self::ephemeris::{
    no_intrinsic_acceleration, AdaptiveStepParameters, BodyId, Ephemeris, EphemerisError,
    FixedStepParameters, IntrinsicAcceleration, UNLIMITED_MAX_EPHEMERIS_STEPS,
};
pub use self::kepler_orbit::{KeplerError, KeplerOrbit, KeplerianElements};
pub use self::massive_body::MassiveBody;
