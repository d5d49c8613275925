use crate::constants::GRAVITATIONAL_CONSTANT;
use serde::{Deserialize, Serialize};

/// A body whose gravity acts on every other body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassiveBody {
    name: String,
    /// GM in m³/s²
    gravitational_parameter: f64,
}

impl MassiveBody {
    /// Create a body from its gravitational parameter in m³/s²
    ///
    /// # Panics
    ///
    /// Panics unless the gravitational parameter is finite and positive.
    pub fn new(name: impl Into<String>, gravitational_parameter: f64) -> Self {
        let name = name.into();
        assert!(
            gravitational_parameter.is_finite() && gravitational_parameter > 0.0,
            "gravitational parameter of {name} must be positive, got {gravitational_parameter}"
        );
        Self {
            name,
            gravitational_parameter,
        }
    }

    /// Create a body from its mass in kilograms
    pub fn from_mass(name: impl Into<String>, mass: f64) -> Self {
        Self::new(name, GRAVITATIONAL_CONSTANT * mass)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gravitational_parameter(&self) -> f64 {
        self.gravitational_parameter
    }

    /// Mass in kilograms
    pub fn mass(&self) -> f64 {
        self.gravitational_parameter / GRAVITATIONAL_CONSTANT
    }
}
