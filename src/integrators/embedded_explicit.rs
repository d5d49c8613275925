//! Embedded explicit Runge–Kutta integrators with adaptive steps

use super::{
    AdaptiveStepIntegrator, AppendState, ComputeAcceleration, IntegrationStatus, StepControl,
    SystemState,
};
use crate::time::Instant;
use log::trace;
use nalgebra::Vector3;

const STAGES: usize = 7;

/// Dormand–Prince 5(4) tableau
const C: [f64; STAGES] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];
const A: [[f64; STAGES]; STAGES] = [
    [0.0; STAGES],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
        0.0,
        0.0,
    ],
    [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
        0.0,
    ],
];
/// Fifth-order weights
const B: [f64; STAGES] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
    0.0,
];
/// Embedded fourth-order weights
const B_HAT: [f64; STAGES] = [
    5179.0 / 57600.0,
    0.0,
    7571.0 / 16695.0,
    393.0 / 640.0,
    -92097.0 / 339200.0,
    187.0 / 2100.0,
    1.0 / 40.0,
];

const SAFETY_FACTOR: f64 = 0.9;
const MIN_STEP_FACTOR: f64 = 0.1;
const MAX_STEP_FACTOR: f64 = 5.0;

/// Dormand–Prince 5(4) applied to the first-order system (q, v)' = (v, a(t, q))
///
/// The step is accepted when the estimated position error is below the
/// length tolerance and the estimated velocity error is below the speed
/// tolerance, for every body.
#[derive(Debug, Clone, Copy, Default)]
pub struct DormandPrince54;

struct StepAttempt {
    positions: Vec<Vector3<f64>>,
    velocities: Vec<Vector3<f64>>,
    /// Largest ratio of estimated error to tolerance, accepted if ≤ 1
    error_ratio: f64,
}

impl DormandPrince54 {
    fn attempt_step(
        &self,
        compute_acceleration: &mut ComputeAcceleration<'_>,
        state: &SystemState,
        step: f64,
        control: &StepControl,
    ) -> StepAttempt {
        let n = state.len();
        let mut kq = vec![vec![Vector3::zeros(); n]; STAGES];
        let mut kv = vec![vec![Vector3::zeros(); n]; STAGES];
        let mut stage_positions = vec![Vector3::zeros(); n];

        for stage in 0..STAGES {
            for i in 0..n {
                let mut q = state.positions[i];
                let mut v = state.velocities[i];
                for j in 0..stage {
                    let a = A[stage][j];
                    if a != 0.0 {
                        q += kq[j][i] * (step * a);
                        v += kv[j][i] * (step * a);
                    }
                }
                stage_positions[i] = q;
                kq[stage][i] = v;
            }
            compute_acceleration(
                state.time + C[stage] * step,
                &stage_positions,
                &mut kv[stage],
            );
        }

        let mut positions = state.positions.clone();
        let mut velocities = state.velocities.clone();
        let mut error_ratio: f64 = 0.0;
        for i in 0..n {
            let mut position_error = Vector3::zeros();
            let mut velocity_error = Vector3::zeros();
            for stage in 0..STAGES {
                positions[i] += kq[stage][i] * (step * B[stage]);
                velocities[i] += kv[stage][i] * (step * B[stage]);
                let e = step * (B[stage] - B_HAT[stage]);
                position_error += kq[stage][i] * e;
                velocity_error += kv[stage][i] * e;
            }
            error_ratio = error_ratio
                .max(position_error.norm() / control.length_tolerance)
                .max(velocity_error.norm() / control.speed_tolerance);
            if !error_ratio.is_finite() {
                error_ratio = f64::INFINITY;
            }
        }

        StepAttempt {
            positions,
            velocities,
            error_ratio,
        }
    }
}

impl AdaptiveStepIntegrator for DormandPrince54 {
    fn name(&self) -> &'static str {
        "Dormand-Prince 5(4)"
    }

    fn solve(
        &self,
        compute_acceleration: &mut ComputeAcceleration<'_>,
        state: &mut SystemState,
        t_final: Instant,
        control: &StepControl,
        append_state: &mut AppendState<'_>,
    ) -> IntegrationStatus {
        assert!(
            control.length_tolerance > 0.0 && control.speed_tolerance > 0.0,
            "integration tolerances must be positive"
        );

        let mut step = t_final - state.time;
        let mut accepted_steps = 0;
        let mut rejected_steps = 0;
        while state.time < t_final {
            if accepted_steps >= control.max_steps {
                trace!(
                    "{} reached {} after {accepted_steps} steps, short of {t_final}",
                    self.name(),
                    state.time
                );
                return IntegrationStatus::ReachedMaxSteps;
            }

            let remaining = t_final - state.time;
            let is_last_step = step >= remaining;
            let attempted_step = if is_last_step { remaining } else { step };
            if state.time + attempted_step == state.time {
                return IntegrationStatus::StepSizeUnderflow;
            }

            let attempt = self.attempt_step(compute_acceleration, state, attempted_step, control);
            if attempt.error_ratio <= 1.0 {
                state.positions = attempt.positions;
                state.velocities = attempt.velocities;
                state.time = if is_last_step {
                    t_final
                } else {
                    state.time + attempted_step
                };
                accepted_steps += 1;
                append_state(state);
            } else {
                rejected_steps += 1;
            }

            let factor = if attempt.error_ratio == 0.0 {
                MAX_STEP_FACTOR
            } else if attempt.error_ratio.is_finite() {
                (SAFETY_FACTOR * attempt.error_ratio.powf(-0.2))
                    .clamp(MIN_STEP_FACTOR, MAX_STEP_FACTOR)
            } else {
                MIN_STEP_FACTOR
            };
            step = attempted_step * factor;
        }

        trace!(
            "{} reached {t_final} with {accepted_steps} accepted and {rejected_steps} rejected steps",
            self.name()
        );
        IntegrationStatus::ReachedFinalTime
    }
}
