//! Closed-form two-body motion from Keplerian elements
//!
//! The orbit of a secondary around a primary is described by its elements at
//! an epoch. State vectors at any other instant follow from the mean anomaly,
//! which advances uniformly, by solving Kepler's equation for the eccentric
//! (or hyperbolic) anomaly with [`bisect`].
//!
//! Elliptic orbits have `0 <= e < 1` and `a > 0`, hyperbolic orbits have
//! `e > 1` and `a < 0`. Parabolic orbits have no finite semimajor axis and are
//! rejected.

use crate::constants::TAU;
use crate::geometry::RelativeDegreesOfFreedom;
use crate::numerics::bisect;
use crate::physics::massive_body::MassiveBody;
use crate::time::Instant;
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for invalid orbital elements
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KeplerError {
    #[error("Eccentricity must be finite and non-negative, got {0}")]
    InvalidEccentricity(f64),

    #[error("Parabolic orbits (eccentricity 1) have no finite semimajor axis")]
    ParabolicOrbit,

    #[error("Semimajor axis {semimajor_axis} m is inconsistent with eccentricity {eccentricity}")]
    InvalidSemimajorAxis {
        semimajor_axis: f64,
        eccentricity: f64,
    },

    #[error("Invalid angle {name}: {value}")]
    InvalidAngle { name: &'static str, value: f64 },
}

/// Osculating elements of an orbit; lengths in metres, angles in radians
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeplerianElements {
    pub semimajor_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub longitude_of_ascending_node: f64,
    pub argument_of_periapsis: f64,
    pub mean_anomaly: f64,
}

impl KeplerianElements {
    fn validate(&self) -> Result<(), KeplerError> {
        let e = self.eccentricity;
        let a = self.semimajor_axis;
        if !e.is_finite() || e < 0.0 {
            return Err(KeplerError::InvalidEccentricity(e));
        }
        if e == 1.0 {
            return Err(KeplerError::ParabolicOrbit);
        }
        let consistent = a.is_finite() && if e < 1.0 { a > 0.0 } else { a < 0.0 };
        if !consistent {
            return Err(KeplerError::InvalidSemimajorAxis {
                semimajor_axis: a,
                eccentricity: e,
            });
        }
        for (name, value) in [
            ("inclination", self.inclination),
            ("longitude_of_ascending_node", self.longitude_of_ascending_node),
            ("argument_of_periapsis", self.argument_of_periapsis),
            ("mean_anomaly", self.mean_anomaly),
        ] {
            if !value.is_finite() {
                return Err(KeplerError::InvalidAngle { name, value });
            }
        }
        Ok(())
    }

    pub fn is_elliptic(&self) -> bool {
        self.eccentricity < 1.0
    }
}

/// The orbit of a secondary body around a primary body
#[derive(Debug, Clone, PartialEq)]
pub struct KeplerOrbit {
    primary_gravitational_parameter: f64,
    secondary_gravitational_parameter: f64,
    elements_at_epoch: KeplerianElements,
    epoch: Instant,
}

impl KeplerOrbit {
    /// Create an orbit around `primary`
    ///
    /// `secondary` is `None` for a massless test particle.
    pub fn new(
        primary: &MassiveBody,
        secondary: Option<&MassiveBody>,
        epoch: Instant,
        elements_at_epoch: KeplerianElements,
    ) -> Result<Self, KeplerError> {
        elements_at_epoch.validate()?;
        Ok(Self {
            primary_gravitational_parameter: primary.gravitational_parameter(),
            secondary_gravitational_parameter: secondary
                .map_or(0.0, MassiveBody::gravitational_parameter),
            elements_at_epoch,
            epoch,
        })
    }

    pub fn elements_at_epoch(&self) -> &KeplerianElements {
        &self.elements_at_epoch
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Mean motion in radians per second
    pub fn mean_motion(&self) -> f64 {
        let a = self.elements_at_epoch.semimajor_axis.abs();
        (self.total_gravitational_parameter() / (a * a * a)).sqrt()
    }

    /// Orbital period in seconds, for elliptic orbits
    pub fn period(&self) -> Option<f64> {
        self.elements_at_epoch
            .is_elliptic()
            .then(|| TAU / self.mean_motion())
    }

    /// Mean anomaly at `t`; reduced to [0, 2π) for elliptic orbits
    pub fn mean_anomaly(&self, t: Instant) -> f64 {
        let mean_anomaly =
            self.elements_at_epoch.mean_anomaly + self.mean_motion() * (t - self.epoch);
        if self.elements_at_epoch.is_elliptic() {
            mean_anomaly.rem_euclid(TAU)
        } else {
            mean_anomaly
        }
    }

    /// State vectors of the secondary relative to the primary
    pub fn primocentric_state_vectors(&self, t: Instant) -> RelativeDegreesOfFreedom {
        state_vectors(
            &self.elements_at_epoch,
            self.elements_at_epoch.semimajor_axis,
            self.total_gravitational_parameter(),
            self.mean_anomaly(t),
        )
    }

    /// State vectors of the secondary relative to the barycentre of the pair
    ///
    /// The orbit around the barycentre is scaled by `μ1 / (μ1 + μ2)` and uses
    /// the gravitational parameter `μ1³ / (μ1 + μ2)²`, which keeps its period.
    pub fn barycentric_state_vectors(&self, t: Instant) -> RelativeDegreesOfFreedom {
        let mu1 = self.primary_gravitational_parameter;
        let total = self.total_gravitational_parameter();
        state_vectors(
            &self.elements_at_epoch,
            self.elements_at_epoch.semimajor_axis * mu1 / total,
            mu1 * mu1 * mu1 / (total * total),
            self.mean_anomaly(t),
        )
    }

    fn total_gravitational_parameter(&self) -> f64 {
        self.primary_gravitational_parameter + self.secondary_gravitational_parameter
    }
}

/// Position and velocity on the orbit with the orientation of `elements`, the
/// given semimajor axis and gravitational parameter, at the given mean anomaly
fn state_vectors(
    elements: &KeplerianElements,
    semimajor_axis: f64,
    gravitational_parameter: f64,
    mean_anomaly: f64,
) -> RelativeDegreesOfFreedom {
    let e = elements.eccentricity;
    let a = semimajor_axis;
    let (position, velocity) = if elements.is_elliptic() {
        let eccentric_anomaly = eccentric_anomaly(e, mean_anomaly);
        let (sin_e, cos_e) = eccentric_anomaly.sin_cos();
        let true_anomaly = 2.0
            * ((1.0 + e).sqrt() * (eccentric_anomaly / 2.0).sin())
                .atan2((1.0 - e).sqrt() * (eccentric_anomaly / 2.0).cos());
        let r = a * (1.0 - e * cos_e);
        let speed_factor = (gravitational_parameter * a).sqrt() / r;
        (
            Vector3::new(true_anomaly.cos(), true_anomaly.sin(), 0.0) * r,
            Vector3::new(-sin_e, (1.0 - e * e).sqrt() * cos_e, 0.0) * speed_factor,
        )
    } else {
        let hyperbolic_anomaly = hyperbolic_anomaly(e, mean_anomaly);
        let (sinh_h, cosh_h) = (hyperbolic_anomaly.sinh(), hyperbolic_anomaly.cosh());
        let true_anomaly = 2.0
            * ((e + 1.0).sqrt() * (hyperbolic_anomaly / 2.0).sinh())
                .atan2((e - 1.0).sqrt() * (hyperbolic_anomaly / 2.0).cosh());
        let r = a * (1.0 - e * cosh_h);
        let speed_factor = (-gravitational_parameter * a).sqrt() / r;
        (
            Vector3::new(true_anomaly.cos(), true_anomaly.sin(), 0.0) * r,
            Vector3::new(-sinh_h, (e * e - 1.0).sqrt() * cosh_h, 0.0) * speed_factor,
        )
    };

    let orientation = Rotation3::from_axis_angle(&Vector3::z_axis(), elements.longitude_of_ascending_node)
        * Rotation3::from_axis_angle(&Vector3::x_axis(), elements.inclination)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), elements.argument_of_periapsis);
    RelativeDegreesOfFreedom::new(orientation * position, orientation * velocity)
}

/// Solve Kepler's equation M = E - e·sin E for 0 <= e < 1
fn eccentric_anomaly(e: f64, mean_anomaly: f64) -> f64 {
    if e == 0.0 {
        return mean_anomaly;
    }
    let kepler_equation = |eccentric_anomaly: f64| {
        mean_anomaly - (eccentric_anomaly - e * eccentric_anomaly.sin())
    };
    // |E - M| = e·|sin E| <= e
    let lower = mean_anomaly - e;
    let upper = mean_anomaly + e;
    if kepler_equation(lower) == 0.0 {
        return lower;
    }
    if kepler_equation(upper) == 0.0 {
        return upper;
    }
    bisect(kepler_equation, lower, upper)
}

/// Solve M = e·sinh H - H for e > 1
fn hyperbolic_anomaly(e: f64, mean_anomaly: f64) -> f64 {
    if mean_anomaly == 0.0 {
        return 0.0;
    }
    let kepler_equation = |hyperbolic_anomaly: f64| {
        mean_anomaly - (e * hyperbolic_anomaly.sinh() - hyperbolic_anomaly)
    };
    // sinh H >= H for H >= 0, so |H| <= asinh(|M| / (e - 1)) in exact
    // arithmetic. For tiny M the rounded residual at that bound may still
    // have the sign of M, so widen it until the root is bracketed.
    let mut bound = (mean_anomaly / (e - 1.0)).asinh();
    if bound == 0.0 {
        return 0.0;
    }
    loop {
        let residual = kepler_equation(bound);
        if residual == 0.0 {
            return bound;
        }
        if (residual < 0.0) != (mean_anomaly < 0.0) {
            break;
        }
        bound *= 2.0;
    }
    bisect(kepler_equation, 0.0, bound)
}
