//! Integrators for second-order ordinary differential equations
//!
//! Every system in this crate has the form q'' = a(t, q): the accelerations
//! depend on the time and the positions only. An integrator advances a
//! [`SystemState`] and reports each state it reaches to an append callback.
//!
//! # Main Components
//!
//! - [`FixedStepIntegrator`]: advances by a constant step, never past the
//!   requested final time. Implemented by [`VelocityVerlet`] and [`RungeKutta4`].
//! - [`AdaptiveStepIntegrator`]: chooses its step from length and speed
//!   tolerances and lands exactly on the final time. Implemented by
//!   [`DormandPrince54`].
//!
//! Integrators are stateless, so they are shared as `Arc<dyn ...>` trait
//! objects between the ephemeris and its users.

pub mod embedded_explicit;
pub mod fixed_step;

use crate::time::Instant;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use self::embedded_explicit::DormandPrince54;
pub use self::fixed_step::{RungeKutta4, VelocityVerlet};

/// Computes the accelerations of all the bodies at a time, from their positions
pub type ComputeAcceleration<'a> = dyn FnMut(Instant, &[Vector3<f64>], &mut [Vector3<f64>]) + 'a;

/// Receives every state reached by an integrator
pub type AppendState<'a> = dyn FnMut(&SystemState) + 'a;

/// Time, positions and velocities of a system of bodies
#[derive(Debug, Clone, PartialEq)]
pub struct SystemState {
    pub time: Instant,
    pub positions: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
}

impl SystemState {
    pub fn new(time: Instant, positions: Vec<Vector3<f64>>, velocities: Vec<Vector3<f64>>) -> Self {
        assert_eq!(
            positions.len(),
            velocities.len(),
            "as many positions as velocities are required"
        );
        Self {
            time,
            positions,
            velocities,
        }
    }

    /// Number of bodies in the system
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// An integrator with a constant step
pub trait FixedStepIntegrator: fmt::Debug + Send + Sync {
    /// Human-readable name, used in logs
    fn name(&self) -> &'static str;

    /// Advance `state` by exactly `step` seconds, leaving `state.time` unchanged
    fn integrate_step(
        &self,
        compute_acceleration: &mut ComputeAcceleration<'_>,
        state: &mut SystemState,
        step: f64,
    );

    /// Advance `state` by whole steps for as long as the next step does not
    /// pass `t_final`, appending every state reached
    ///
    /// The time after `n` steps is computed as `start + n·step` rather than
    /// accumulated, so long integrations do not drift off the step grid.
    ///
    /// # Panics
    ///
    /// Panics unless `step > 0`.
    fn solve(
        &self,
        compute_acceleration: &mut ComputeAcceleration<'_>,
        state: &mut SystemState,
        t_final: Instant,
        step: f64,
        append_state: &mut AppendState<'_>,
    ) {
        assert!(step > 0.0, "integration step must be positive, got {step}");
        let start = state.time;
        let mut steps: u64 = 0;
        loop {
            let next = start + (steps + 1) as f64 * step;
            if next > t_final {
                break;
            }
            self.integrate_step(compute_acceleration, state, step);
            steps += 1;
            state.time = next;
            append_state(state);
        }
    }
}

/// Limits of an adaptive integration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepControl {
    /// Tolerated position error per step, in metres
    pub length_tolerance: f64,
    /// Tolerated velocity error per step, in metres per second
    pub speed_tolerance: f64,
    /// Maximum number of accepted steps
    pub max_steps: usize,
}

/// How an adaptive integration ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationStatus {
    /// The state is at the requested final time
    ReachedFinalTime,
    /// The step budget ran out before the final time
    ReachedMaxSteps,
    /// The step size became too small to advance the time
    StepSizeUnderflow,
}

/// An integrator choosing its own steps from error tolerances
pub trait AdaptiveStepIntegrator: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Advance `state` to `t_final`, appending every accepted state
    ///
    /// The last step is shortened so that the final state is exactly at
    /// `t_final`. If `t_final` is not after `state.time`, nothing happens.
    fn solve(
        &self,
        compute_acceleration: &mut ComputeAcceleration<'_>,
        state: &mut SystemState,
        t_final: Instant,
        control: &StepControl,
        append_state: &mut AppendState<'_>,
    ) -> IntegrationStatus;
}

/// Selects a fixed-step integrator by name in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedStepIntegratorKind {
    VelocityVerlet,
    #[default]
    #[serde(rename = "runge_kutta_4")]
    RungeKutta4,
}

impl FixedStepIntegratorKind {
    pub fn integrator(self) -> Arc<dyn FixedStepIntegrator> {
        match self {
            FixedStepIntegratorKind::VelocityVerlet => Arc::new(VelocityVerlet),
            FixedStepIntegratorKind::RungeKutta4 => Arc::new(RungeKutta4),
        }
    }
}

impl fmt::Display for FixedStepIntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixedStepIntegratorKind::VelocityVerlet => write!(f, "velocity_verlet"),
            FixedStepIntegratorKind::RungeKutta4 => write!(f, "runge_kutta_4"),
        }
    }
}

impl FromStr for FixedStepIntegratorKind {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "velocity_verlet" => Ok(FixedStepIntegratorKind::VelocityVerlet),
            "runge_kutta_4" => Ok(FixedStepIntegratorKind::RungeKutta4),
            _ => Err(format!(
                "unknown integrator {name:?}, expected velocity_verlet or runge_kutta_4"
            )),
        }
    }
}
