//! Fixed-step integrators
//!
//! All the stages of these methods are evaluated within `[t, t + step]`, so
//! they can integrate in the field of an ephemeris that only covers the
//! integration interval.

use super::{ComputeAcceleration, FixedStepIntegrator, SystemState};
use nalgebra::Vector3;

/// Kick-drift-kick leapfrog: symplectic, second order, two evaluations per step
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityVerlet;

/// Classical fourth-order Runge–Kutta method applied to q'' = a(t, q)
#[derive(Debug, Clone, Copy, Default)]
pub struct RungeKutta4;

impl FixedStepIntegrator for VelocityVerlet {
    fn name(&self) -> &'static str {
        "velocity Verlet"
    }

    fn integrate_step(
        &self,
        compute_acceleration: &mut ComputeAcceleration<'_>,
        state: &mut SystemState,
        step: f64,
    ) {
        let n = state.len();
        let mut accelerations = vec![Vector3::zeros(); n];
        let half_step = 0.5 * step;

        compute_acceleration(state.time, &state.positions, &mut accelerations);
        for i in 0..n {
            state.velocities[i] += accelerations[i] * half_step;
            state.positions[i] += state.velocities[i] * step;
        }
        compute_acceleration(state.time + step, &state.positions, &mut accelerations);
        for i in 0..n {
            state.velocities[i] += accelerations[i] * half_step;
        }
    }
}

impl FixedStepIntegrator for RungeKutta4 {
    fn name(&self) -> &'static str {
        "Runge-Kutta 4"
    }

    fn integrate_step(
        &self,
        compute_acceleration: &mut ComputeAcceleration<'_>,
        state: &mut SystemState,
        step: f64,
    ) {
        let n = state.len();
        let t = state.time;
        let q = &state.positions;
        let v = &state.velocities;

        // Stage derivatives: dq = velocity, dv = acceleration.
        let mut dv1 = vec![Vector3::zeros(); n];
        let mut dv2 = vec![Vector3::zeros(); n];
        let mut dv3 = vec![Vector3::zeros(); n];
        let mut dv4 = vec![Vector3::zeros(); n];

        compute_acceleration(t, q, &mut dv1);
        let dq1 = v.clone();

        let dq2: Vec<Vector3<f64>> = (0..n).map(|i| v[i] + dv1[i] * (0.5 * step)).collect();
        let q2: Vec<Vector3<f64>> = (0..n).map(|i| q[i] + dq1[i] * (0.5 * step)).collect();
        compute_acceleration(t + 0.5 * step, &q2, &mut dv2);

        let dq3: Vec<Vector3<f64>> = (0..n).map(|i| v[i] + dv2[i] * (0.5 * step)).collect();
        let q3: Vec<Vector3<f64>> = (0..n).map(|i| q[i] + dq2[i] * (0.5 * step)).collect();
        compute_acceleration(t + 0.5 * step, &q3, &mut dv3);

        let dq4: Vec<Vector3<f64>> = (0..n).map(|i| v[i] + dv3[i] * step).collect();
        let q4: Vec<Vector3<f64>> = (0..n).map(|i| q[i] + dq3[i] * step).collect();
        compute_acceleration(t + step, &q4, &mut dv4);

        let sixth = step / 6.0;
        for i in 0..n {
            state.positions[i] += (dq1[i] + (dq2[i] + dq3[i]) * 2.0 + dq4[i]) * sixth;
            state.velocities[i] += (dv1[i] + (dv2[i] + dv3[i]) * 2.0 + dv4[i]) * sixth;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrators::test_systems::*;
    use crate::time::Instant;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn final_error(integrator: &dyn FixedStepIntegrator, step: f64) -> f64 {
        let mut state = oscillator_state();
        let t_final = Instant::from_seconds_since_j2000(2.0);
        integrator.solve(
            &mut harmonic_oscillator,
            &mut state,
            t_final,
            step,
            &mut |_: &SystemState| {},
        );
        assert_relative_eq!(state.time.seconds_since_j2000(), 2.0, epsilon = 1e-12);
        let exact = Vector3::new(2.0_f64.cos(), 2.0_f64.sin(), 0.0);
        (state.positions[0] - exact).norm()
    }

    #[rstest]
    #[case(&VelocityVerlet, 2.0)]
    #[case(&RungeKutta4, 4.0)]
    fn test_convergence_order(#[case] integrator: &dyn FixedStepIntegrator, #[case] order: f64) {
        let coarse = final_error(integrator, 0.02);
        let fine = final_error(integrator, 0.01);
        let observed_order = (coarse / fine).log2();
        assert!(
            (observed_order - order).abs() < 0.2,
            "{} converges with order {observed_order}",
            integrator.name()
        );
    }

    #[test]
    fn test_verlet_conserves_energy() {
        let mut state = oscillator_state();
        let mut max_energy_error: f64 = 0.0;
        VelocityVerlet.solve(
            &mut harmonic_oscillator,
            &mut state,
            Instant::from_seconds_since_j2000(1000.0),
            0.02,
            &mut |s: &SystemState| {
                let energy = 0.5 * (s.velocities[0].norm_squared() + s.positions[0].norm_squared());
                max_energy_error = max_energy_error.max((energy - 1.0).abs());
            },
        );
        // Bounded, not drifting, energy error
        assert!(max_energy_error < 1e-3);
    }

    #[test]
    fn test_stage_times_stay_within_step() {
        let start = Instant::from_seconds_since_j2000(10.0);
        let mut state = SystemState::new(start, vec![Vector3::zeros()], vec![Vector3::zeros()]);
        let mut seen = Vec::new();
        RungeKutta4.integrate_step(
            &mut |t: Instant, _: &[Vector3<f64>], a: &mut [Vector3<f64>]| {
                seen.push(t);
                a[0] = Vector3::new(1.0, 0.0, 0.0);
            },
            &mut state,
            2.0,
        );
        assert_eq!(seen.len(), 4);
        assert!(seen.iter().all(|&t| t >= start && t <= start + 2.0));
        // Constant acceleration is integrated exactly.
        assert_relative_eq!(state.positions[0].x, 2.0, epsilon = 1e-14);
        assert_relative_eq!(state.velocities[0].x, 2.0, epsilon = 1e-14);
    }
}
