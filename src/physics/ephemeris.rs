//! N-body ephemeris of massive bodies, and flows of massless bodies in its field
//!
//! The [`Ephemeris`] integrates all its massive bodies together with a
//! fixed-step integrator, in lockstep, and records the motion of each body in
//! a [`ContinuousTrajectory`]. The trajectories can then be queried at any
//! instant of their common range, which is what makes it possible to
//! integrate massless bodies (spacecraft, pile-ups) in the field of the
//! massive ones, with their own integrators and steps.

use crate::geometry::DegreesOfFreedom;
use crate::integrators::{
    AdaptiveStepIntegrator, FixedStepIntegrator, IntegrationStatus, StepControl, SystemState,
};
use crate::physics::continuous_trajectory::{ContinuousTrajectory, FittingTolerances};
use crate::physics::discrete_trajectory::DiscreteTrajectory;
use crate::physics::massive_body::MassiveBody;
use crate::time::Instant;
use log::{debug, warn};
use nalgebra::Vector3;
use std::sync::Arc;
use thiserror::Error;

/// Use as `max_steps` to integrate until the final time whatever it takes
pub const UNLIMITED_MAX_EPHEMERIS_STEPS: usize = usize::MAX;

/// An acceleration applied to a massless body besides gravity, e.g. thrust
pub type IntrinsicAcceleration<'a> = dyn Fn(Instant) -> Vector3<f64> + 'a;

/// The intrinsic acceleration of a free-falling body
pub fn no_intrinsic_acceleration(_t: Instant) -> Vector3<f64> {
    Vector3::zeros()
}

/// Errors from flowing massless bodies
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("Integration stopped at {reached} after {max_steps} steps, short of {requested}")]
    StepBudgetExhausted {
        /// Time of the last state appended to the trajectory
        reached: Instant,
        requested: Instant,
        max_steps: usize,
    },

    #[error("Integration step size vanished at {reached}, short of {requested}")]
    StepSizeUnderflow { reached: Instant, requested: Instant },
}

/// Handle to a body of an [`Ephemeris`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(usize);

impl BodyId {
    /// Position of the body in the ephemeris
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A fixed-step integrator with its step
#[derive(Debug, Clone)]
pub struct FixedStepParameters {
    integrator: Arc<dyn FixedStepIntegrator>,
    step: f64,
}

impl FixedStepParameters {
    /// # Panics
    ///
    /// Panics unless `step > 0`.
    pub fn new(integrator: Arc<dyn FixedStepIntegrator>, step: f64) -> Self {
        assert!(step > 0.0, "integration step must be positive, got {step}");
        Self { integrator, step }
    }

    pub fn integrator(&self) -> &dyn FixedStepIntegrator {
        self.integrator.as_ref()
    }

    pub fn step(&self) -> f64 {
        self.step
    }
}

/// An adaptive-step integrator with its tolerances and step budget
#[derive(Debug, Clone)]
pub struct AdaptiveStepParameters {
    integrator: Arc<dyn AdaptiveStepIntegrator>,
    max_steps: usize,
    length_integration_tolerance: f64,
    speed_integration_tolerance: f64,
}

impl AdaptiveStepParameters {
    /// # Panics
    ///
    /// Panics unless both tolerances are positive.
    pub fn new(
        integrator: Arc<dyn AdaptiveStepIntegrator>,
        max_steps: usize,
        length_integration_tolerance: f64,
        speed_integration_tolerance: f64,
    ) -> Self {
        assert!(
            length_integration_tolerance > 0.0 && speed_integration_tolerance > 0.0,
            "integration tolerances must be positive, got {length_integration_tolerance} m and {speed_integration_tolerance} m/s"
        );
        Self {
            integrator,
            max_steps,
            length_integration_tolerance,
            speed_integration_tolerance,
        }
    }

    pub fn integrator(&self) -> &dyn AdaptiveStepIntegrator {
        self.integrator.as_ref()
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn length_integration_tolerance(&self) -> f64 {
        self.length_integration_tolerance
    }

    pub fn speed_integration_tolerance(&self) -> f64 {
        self.speed_integration_tolerance
    }

    fn step_control(&self) -> StepControl {
        StepControl {
            length_tolerance: self.length_integration_tolerance,
            speed_tolerance: self.speed_integration_tolerance,
            max_steps: self.max_steps,
        }
    }
}

/// Massive bodies, their fitted trajectories, and the state of their integration
#[derive(Debug)]
pub struct Ephemeris {
    bodies: Vec<MassiveBody>,
    trajectories: Vec<ContinuousTrajectory>,
    planetary_integrator: FixedStepParameters,
    last_state: SystemState,
}

impl Ephemeris {
    /// Create an ephemeris with the given bodies in the given initial state
    ///
    /// # Panics
    ///
    /// Panics if there are no bodies, if `initial_state` does not have one
    /// entry per body, or if the fitting tolerances are invalid.
    pub fn new(
        bodies: Vec<MassiveBody>,
        initial_state: Vec<DegreesOfFreedom>,
        initial_time: Instant,
        planetary_integrator: FixedStepParameters,
        fitting_tolerances: FittingTolerances,
    ) -> Self {
        assert!(!bodies.is_empty(), "an ephemeris needs at least one body");
        assert_eq!(
            bodies.len(),
            initial_state.len(),
            "one initial state per body is required"
        );

        let step = planetary_integrator.step();
        let mut trajectories = Vec::with_capacity(bodies.len());
        for degrees_of_freedom in &initial_state {
            let mut trajectory =
                ContinuousTrajectory::new(step, fitting_tolerances.low, fitting_tolerances.high);
            trajectory.append(initial_time, *degrees_of_freedom);
            trajectories.push(trajectory);
        }
        let last_state = SystemState::new(
            initial_time,
            initial_state.iter().map(|dof| dof.position()).collect(),
            initial_state.iter().map(|dof| dof.velocity()).collect(),
        );

        debug!(
            "Ephemeris of {} bodies at {initial_time}, {} with a step of {step} s",
            bodies.len(),
            planetary_integrator.integrator().name()
        );
        Self {
            bodies,
            trajectories,
            planetary_integrator,
            last_state,
        }
    }

    /// Identifiers and bodies, in creation order
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &MassiveBody)> + '_ {
        self.bodies
            .iter()
            .enumerate()
            .map(|(index, body)| (BodyId(index), body))
    }

    /// Identifier of the body with the given name
    pub fn body_id(&self, name: &str) -> Option<BodyId> {
        self.bodies
            .iter()
            .position(|body| body.name() == name)
            .map(BodyId)
    }

    /// # Panics
    ///
    /// Panics if `body` does not belong to this ephemeris.
    pub fn body(&self, body: BodyId) -> &MassiveBody {
        self.bodies
            .get(body.0)
            .unwrap_or_else(|| panic!("{body:?} is not a body of this ephemeris"))
    }

    /// # Panics
    ///
    /// Panics if `body` does not belong to this ephemeris.
    pub fn trajectory(&self, body: BodyId) -> &ContinuousTrajectory {
        self.trajectories
            .get(body.0)
            .unwrap_or_else(|| panic!("{body:?} is not a body of this ephemeris"))
    }

    /// The planetary integration step
    pub fn step(&self) -> f64 {
        self.planetary_integrator.step()
    }

    /// Time of the most recent planetary integration state
    pub fn last_state_time(&self) -> Instant {
        self.last_state.time
    }

    /// Start of the range over which all the trajectories can be queried
    pub fn t_min(&self) -> Instant {
        self.trajectories
            .iter()
            .map(ContinuousTrajectory::t_min)
            .fold(Instant::from_seconds_since_j2000(f64::NEG_INFINITY), Instant::max)
    }

    /// End of the range over which all the trajectories can be queried
    pub fn t_max(&self) -> Instant {
        self.trajectories
            .iter()
            .map(ContinuousTrajectory::t_max)
            .fold(Instant::from_seconds_since_j2000(f64::INFINITY), Instant::min)
    }

    /// Covers every stage time of a flow to `t`
    ///
    /// Stage times are computed as `time + c·h` and may round an ulp past
    /// `t`, so the ephemeris is prolonged one planetary step beyond it.
    fn prolong_for_flow(&mut self, t: Instant) {
        let margin = self.step();
        self.prolong(t + margin);
    }

    /// Integrate the massive bodies until `t_max() >= t`
    pub fn prolong(&mut self, t: Instant) {
        if t <= self.t_max() {
            return;
        }

        let Self {
            bodies,
            trajectories,
            planetary_integrator,
            last_state,
        } = self;
        let gravitational_parameters: Vec<f64> = bodies
            .iter()
            .map(MassiveBody::gravitational_parameter)
            .collect();
        let step = planetary_integrator.step();

        let mut compute_acceleration =
            |_: Instant, positions: &[Vector3<f64>], accelerations: &mut [Vector3<f64>]| {
                compute_gravitational_accelerations_between_massive_bodies(
                    &gravitational_parameters,
                    positions,
                    accelerations,
                )
            };
        let mut append_state = |state: &SystemState| {
            for (i, trajectory) in trajectories.iter_mut().enumerate() {
                trajectory.append(
                    state.time,
                    DegreesOfFreedom::new(state.positions[i], state.velocities[i]),
                );
            }
        };

        while last_state.time < t {
            // Aim half a step past the last needed step so that rounding
            // cannot drop it.
            let steps = ((t - last_state.time) / step).ceil().max(1.0);
            let t_final = last_state.time + (steps + 0.5) * step;
            planetary_integrator.integrator().solve(
                &mut compute_acceleration,
                last_state,
                t_final,
                step,
                &mut append_state,
            );
        }
        debug!("Ephemeris prolonged to {}", self.last_state.time);
    }

    /// Integrate massless bodies with a fixed step until the next step would
    /// pass `t`
    ///
    /// Each trajectory is extended from its last point, in the gravitational
    /// field of the ephemeris plus its own intrinsic acceleration.
    ///
    /// # Panics
    ///
    /// Panics if the trajectories and accelerations differ in number, or if
    /// the trajectories are empty or do not all end at the same time.
    pub fn flow_with_fixed_step(
        &mut self,
        trajectories: &mut [&mut DiscreteTrajectory],
        intrinsic_accelerations: &[&IntrinsicAcceleration<'_>],
        t: Instant,
        parameters: &FixedStepParameters,
    ) {
        assert_eq!(
            trajectories.len(),
            intrinsic_accelerations.len(),
            "one intrinsic acceleration per trajectory is required"
        );
        if trajectories.is_empty() {
            return;
        }
        let mut state = initial_state_of(trajectories.iter().map(|trajectory| &**trajectory));
        self.prolong_for_flow(t);

        let ephemeris = &*self;
        let mut compute_acceleration =
            |time: Instant, positions: &[Vector3<f64>], accelerations: &mut [Vector3<f64>]| {
                for (i, acceleration) in accelerations.iter_mut().enumerate() {
                    *acceleration = ephemeris
                        .compute_gravitational_acceleration_on_massless_body(positions[i], time)
                        + intrinsic_accelerations[i](time);
                }
            };
        let mut append_state = |state: &SystemState| {
            for (i, trajectory) in trajectories.iter_mut().enumerate() {
                trajectory.append(
                    state.time,
                    DegreesOfFreedom::new(state.positions[i], state.velocities[i]),
                );
            }
        };
        parameters.integrator().solve(
            &mut compute_acceleration,
            &mut state,
            t,
            parameters.step(),
            &mut append_state,
        );
    }

    /// Integrate a massless body with an adaptive step until exactly `t`
    ///
    /// If the step budget runs out first, the states reached so far remain
    /// in `trajectory` and an error is returned.
    ///
    /// # Panics
    ///
    /// Panics if `trajectory` is empty.
    pub fn flow_with_adaptive_step(
        &mut self,
        trajectory: &mut DiscreteTrajectory,
        intrinsic_acceleration: &IntrinsicAcceleration<'_>,
        t: Instant,
        parameters: &AdaptiveStepParameters,
    ) -> Result<(), EphemerisError> {
        let mut state = initial_state_of(std::iter::once(&*trajectory));
        if t <= state.time {
            return Ok(());
        }
        self.prolong_for_flow(t);

        let ephemeris = &*self;
        let mut compute_acceleration =
            |time: Instant, positions: &[Vector3<f64>], accelerations: &mut [Vector3<f64>]| {
                accelerations[0] = ephemeris
                    .compute_gravitational_acceleration_on_massless_body(positions[0], time)
                    + intrinsic_acceleration(time);
            };
        let mut append_state = |state: &SystemState| {
            trajectory.append(
                state.time,
                DegreesOfFreedom::new(state.positions[0], state.velocities[0]),
            );
        };
        let status = parameters.integrator().solve(
            &mut compute_acceleration,
            &mut state,
            t,
            &parameters.step_control(),
            &mut append_state,
        );

        match status {
            IntegrationStatus::ReachedFinalTime => Ok(()),
            IntegrationStatus::ReachedMaxSteps => {
                warn!(
                    "{} exhausted {} steps at {}, short of {t}",
                    parameters.integrator().name(),
                    parameters.max_steps(),
                    state.time
                );
                Err(EphemerisError::StepBudgetExhausted {
                    reached: state.time,
                    requested: t,
                    max_steps: parameters.max_steps(),
                })
            }
            IntegrationStatus::StepSizeUnderflow => {
                warn!("Step size underflow at {}, short of {t}", state.time);
                Err(EphemerisError::StepSizeUnderflow {
                    reached: state.time,
                    requested: t,
                })
            }
        }
    }

    /// Drop the trajectory data needed only for queries before `t`
    ///
    /// # Panics
    ///
    /// Panics unless `t <= t_max()`.
    pub fn forget_before(&mut self, t: Instant) {
        for trajectory in &mut self.trajectories {
            trajectory.forget_before(t);
        }
    }

    /// Gravitational acceleration of the massive bodies at `position` and `t`
    ///
    /// # Panics
    ///
    /// Panics unless `t_min() <= t <= t_max()`.
    pub fn compute_gravitational_acceleration_on_massless_body(
        &self,
        position: Vector3<f64>,
        t: Instant,
    ) -> Vector3<f64> {
        self.bodies
            .iter()
            .zip(&self.trajectories)
            .fold(Vector3::zeros(), |acceleration, (body, trajectory)| {
                let r = trajectory.evaluate_position(t) - position;
                let r2 = r.norm_squared();
                acceleration + r * (body.gravitational_parameter() / (r2 * r2.sqrt()))
            })
    }
}

/// Newtonian gravity between every pair of bodies
fn compute_gravitational_accelerations_between_massive_bodies(
    gravitational_parameters: &[f64],
    positions: &[Vector3<f64>],
    accelerations: &mut [Vector3<f64>],
) {
    accelerations.fill(Vector3::zeros());
    for b1 in 0..positions.len() {
        for b2 in b1 + 1..positions.len() {
            let r = positions[b1] - positions[b2];
            let r2 = r.norm_squared();
            let one_over_r3 = 1.0 / (r2 * r2.sqrt());
            accelerations[b1] -= r * (gravitational_parameters[b2] * one_over_r3);
            accelerations[b2] += r * (gravitational_parameters[b1] * one_over_r3);
        }
    }
}

/// The common last state of the given trajectories
fn initial_state_of<'a>(
    trajectories: impl Iterator<Item = &'a DiscreteTrajectory>,
) -> SystemState {
    let mut time = None;
    let mut positions = Vec::new();
    let mut velocities = Vec::new();
    for trajectory in trajectories {
        let last = trajectory
            .last()
            .unwrap_or_else(|| panic!("cannot flow an empty trajectory"));
        match time {
            None => time = Some(last.time),
            Some(time) => assert_eq!(
                time, last.time,
                "flowed trajectories must all end at the same time"
            ),
        }
        positions.push(last.degrees_of_freedom.position());
        velocities.push(last.degrees_of_freedom.velocity());
    }
    let time = time.unwrap_or_else(|| panic!("no trajectory to flow"));
    SystemState::new(time, positions, velocities)
}
