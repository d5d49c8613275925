//! Body catalogs and simulation configuration
//!
//! Catalogs are JSON documents listing the massive bodies of a system with
//! their gravitational parameters and barycentric state vectors at an epoch:
//!
//! ```json
//! {
//!   "epoch_jd": 2451545.0,
//!   "bodies": [
//!     { "name": "Sun", "gravitational_parameter": 1.32712440018e20,
//!       "position": [0.0, 0.0, 0.0], "velocity": [0.0, 0.0, 0.0] }
//!   ]
//! }
//! ```
//!
//! A [`SimulationConfig`] pairs a catalog with the [`EphemerisParameters`]
//! used to integrate it.

pub mod solar_system;

pub use self::solar_system::solar_system;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::J2000;
use crate::geometry::DegreesOfFreedom;
use crate::integrators::FixedStepIntegratorKind;
use crate::physics::{
    Ephemeris, FittingTolerances, FixedStepParameters, KeplerError, MassiveBody,
};
use crate::time::Instant;

/// Error type for catalog and configuration loading
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Error when reading or writing a file fails
    #[error("File I/O error on {path:?}: {source}")]
    FileError {
        /// The path of the file that caused the error
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog contains no bodies")]
    Empty,

    #[error("Invalid body {name}: {reason}")]
    InvalidBody { name: String, reason: String },

    #[error("Duplicate body name: {0}")]
    DuplicateBody(String),

    #[error("Invalid ephemeris parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid orbital elements: {0}")]
    Kepler(#[from] KeplerError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

fn io_err(path: impl Into<PathBuf>, err: std::io::Error) -> CatalogError {
    CatalogError::FileError {
        path: path.into(),
        source: err,
    }
}

fn default_epoch_jd() -> f64 {
    J2000
}

/// One body of a catalog; SI units, barycentric frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    /// GM in m³/s²
    pub gravitational_parameter: f64,
    /// Position in metres
    pub position: [f64; 3],
    /// Velocity in metres per second
    pub velocity: [f64; 3],
}

impl CatalogEntry {
    pub fn new(body: &MassiveBody, degrees_of_freedom: &DegreesOfFreedom) -> Self {
        let position = degrees_of_freedom.position();
        let velocity = degrees_of_freedom.velocity();
        Self {
            name: body.name().to_string(),
            gravitational_parameter: body.gravitational_parameter(),
            position: [position.x, position.y, position.z],
            velocity: [velocity.x, velocity.y, velocity.z],
        }
    }

    pub fn degrees_of_freedom(&self) -> DegreesOfFreedom {
        DegreesOfFreedom::new(
            Vector3::from(self.position),
            Vector3::from(self.velocity),
        )
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| CatalogError::InvalidBody {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if !(self.gravitational_parameter.is_finite() && self.gravitational_parameter > 0.0) {
            return Err(invalid(&format!(
                "gravitational parameter must be positive, got {}",
                self.gravitational_parameter
            )));
        }
        if !self.position.iter().all(|x| x.is_finite()) {
            return Err(invalid("position is not finite"));
        }
        if !self.velocity.iter().all(|v| v.is_finite()) {
            return Err(invalid("velocity is not finite"));
        }
        Ok(())
    }
}

/// The massive bodies of a system at an epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyCatalog {
    /// Epoch of the state vectors, as a TDB Julian date
    #[serde(default = "default_epoch_jd")]
    pub epoch_jd: f64,
    pub bodies: Vec<CatalogEntry>,
}

impl BodyCatalog {
    /// Build a catalog from parallel lists of bodies and states
    ///
    /// # Panics
    ///
    /// Panics if `bodies` and `states` differ in length.
    pub fn from_bodies(epoch: Instant, bodies: &[MassiveBody], states: &[DegreesOfFreedom]) -> Self {
        assert_eq!(bodies.len(), states.len(), "one state per body is required");
        Self {
            epoch_jd: epoch.julian_date(),
            bodies: bodies
                .iter()
                .zip(states)
                .map(|(body, state)| CatalogEntry::new(body, state))
                .collect(),
        }
    }

    /// Parse and validate a catalog
    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let catalog = Self::from_json_str(&json)?;
        debug!(
            "Loaded {} bodies from {}",
            catalog.bodies.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json_string()?).map_err(|e| io_err(path, e))
    }

    pub fn epoch(&self) -> Instant {
        Instant::from_julian_date(self.epoch_jd)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Check that the catalog can seed an ephemeris
    pub fn validate(&self) -> Result<()> {
        if self.bodies.is_empty() {
            return Err(CatalogError::Empty);
        }
        if !self.epoch_jd.is_finite() {
            return Err(CatalogError::InvalidParameters(format!(
                "epoch must be finite, got {}",
                self.epoch_jd
            )));
        }
        let mut names = HashSet::new();
        for entry in &self.bodies {
            entry.validate()?;
            if !names.insert(entry.name.as_str()) {
                return Err(CatalogError::DuplicateBody(entry.name.clone()));
            }
        }
        Ok(())
    }

    /// Split into the parallel lists expected by [`Ephemeris::new`]
    pub fn into_bodies_and_states(self) -> Result<(Vec<MassiveBody>, Vec<DegreesOfFreedom>)> {
        self.validate()?;
        Ok(self
            .bodies
            .into_iter()
            .map(|entry| {
                let degrees_of_freedom = entry.degrees_of_freedom();
                (
                    MassiveBody::new(entry.name, entry.gravitational_parameter),
                    degrees_of_freedom,
                )
            })
            .unzip())
    }
}

/// How the massive bodies are integrated and fitted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EphemerisParameters {
    /// Integration step in seconds
    pub step: f64,
    /// Fitting tolerance aimed for, in metres
    pub low_fitting_tolerance: f64,
    /// Fitting tolerance accepted when the low one cannot be met, in metres
    pub high_fitting_tolerance: f64,
    pub integrator: FixedStepIntegratorKind,
}

impl Default for EphemerisParameters {
    fn default() -> Self {
        Self {
            step: 3600.0,
            low_fitting_tolerance: 1.0,
            high_fitting_tolerance: 100.0,
            integrator: FixedStepIntegratorKind::default(),
        }
    }
}

impl EphemerisParameters {
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn with_fitting_tolerances(mut self, low: f64, high: f64) -> Self {
        self.low_fitting_tolerance = low;
        self.high_fitting_tolerance = high;
        self
    }

    pub fn with_integrator(mut self, integrator: FixedStepIntegratorKind) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(CatalogError::InvalidParameters(format!(
                "step must be positive, got {}",
                self.step
            )));
        }
        let (low, high) = (self.low_fitting_tolerance, self.high_fitting_tolerance);
        if !(low.is_finite() && high.is_finite() && low > 0.0 && low <= high) {
            return Err(CatalogError::InvalidParameters(format!(
                "fitting tolerances must satisfy 0 < low <= high, got {low} and {high}"
            )));
        }
        Ok(())
    }

    pub fn fixed_step_parameters(&self) -> FixedStepParameters {
        FixedStepParameters::new(self.integrator.integrator(), self.step)
    }

    pub fn fitting_tolerances(&self) -> FittingTolerances {
        FittingTolerances::new(self.low_fitting_tolerance, self.high_fitting_tolerance)
    }
}

/// A catalog together with the parameters of its ephemeris
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub catalog: BodyCatalog,
    #[serde(default)]
    pub ephemeris: EphemerisParameters,
}

impl SimulationConfig {
    pub fn new(catalog: BodyCatalog, ephemeris: EphemerisParameters) -> Self {
        Self { catalog, ephemeris }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.catalog.validate()?;
        config.ephemeris.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Self::from_json_str(&json)
    }

    /// An ephemeris whose bodies start in the catalog state at its epoch
    pub fn build_ephemeris(&self) -> Result<Ephemeris> {
        self.ephemeris.validate()?;
        let epoch = self.catalog.epoch();
        let (bodies, states) = self.catalog.clone().into_bodies_and_states()?;
        debug!(
            "Building an ephemeris of {} bodies at JD {} with {}",
            bodies.len(),
            self.catalog.epoch_jd,
            self.ephemeris.integrator
        );
        Ok(Ephemeris::new(
            bodies,
            states,
            epoch,
            self.ephemeris.fixed_step_parameters(),
            self.ephemeris.fitting_tolerances(),
        ))
    }
}
