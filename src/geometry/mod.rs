//! # Geometry Module
//!
//! Positions and velocities are `nalgebra::Vector3<f64>` in SI units (metres
//! and metres per second) in a single inertial, right-handed reference frame:
//! - **X-axis**: toward the vernal equinox
//! - **Z-axis**: toward the north pole of the reference plane
//!
//! [`DegreesOfFreedom`] pairs a position with a velocity; it is the sample
//! type of every trajectory in the crate and, when the origin is another body,
//! also serves as relative state vectors.

use nalgebra::Vector3;
use std::ops::{Add, Sub};

/// A (position, velocity) pair at one instant
///
/// Immutable once created: the fields are private and only read through
/// accessors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegreesOfFreedom {
    position: Vector3<f64>,
    velocity: Vector3<f64>,
}

/// State vectors of one body with respect to another
pub type RelativeDegreesOfFreedom = DegreesOfFreedom;

impl DegreesOfFreedom {
    /// Creates new degrees of freedom
    ///
    /// # Arguments
    ///
    /// * `position` - Position in metres
    /// * `velocity` - Velocity in metres per second
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self { position, velocity }
    }

    /// Position in metres
    pub fn position(&self) -> Vector3<f64> {
        self.position
    }

    /// Velocity in metres per second
    pub fn velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    /// Distance to `other` in position space
    pub fn position_distance(&self, other: &DegreesOfFreedom) -> f64 {
        (self.position - other.position).norm()
    }

    /// Distance to `other` in velocity space
    pub fn velocity_distance(&self, other: &DegreesOfFreedom) -> f64 {
        (self.velocity - other.velocity).norm()
    }
}

impl Add<RelativeDegreesOfFreedom> for DegreesOfFreedom {
    type Output = DegreesOfFreedom;

    fn add(self, relative: RelativeDegreesOfFreedom) -> Self::Output {
        DegreesOfFreedom::new(
            self.position + relative.position,
            self.velocity + relative.velocity,
        )
    }
}

impl Sub<DegreesOfFreedom> for DegreesOfFreedom {
    type Output = RelativeDegreesOfFreedom;

    fn sub(self, origin: DegreesOfFreedom) -> Self::Output {
        DegreesOfFreedom::new(
            self.position - origin.position,
            self.velocity - origin.velocity,
        )
    }
}

/// Accumulates weighted degrees of freedom and returns their barycentre
#[derive(Debug, Clone, Default)]
pub struct BarycentreCalculator {
    weighted_positions: Vector3<f64>,
    weighted_velocities: Vector3<f64>,
    total_weight: f64,
}

impl BarycentreCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `degrees_of_freedom` with the given (positive) weight, usually a mass
    pub fn add(&mut self, degrees_of_freedom: &DegreesOfFreedom, weight: f64) {
        assert!(weight > 0.0, "barycentre weight must be positive, got {weight}");
        self.weighted_positions += degrees_of_freedom.position * weight;
        self.weighted_velocities += degrees_of_freedom.velocity * weight;
        self.total_weight += weight;
    }

    /// Sum of the weights added so far
    pub fn weight(&self) -> f64 {
        self.total_weight
    }

    /// The barycentre of everything added so far
    ///
    /// # Panics
    ///
    /// Panics if nothing was added.
    pub fn get(&self) -> DegreesOfFreedom {
        assert!(
            self.total_weight > 0.0,
            "cannot compute the barycentre of nothing"
        );
        DegreesOfFreedom::new(
            self.weighted_positions / self.total_weight,
            self.weighted_velocities / self.total_weight,
        )
    }
}
