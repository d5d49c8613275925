//! Rigid groups of parts moving as one body in the field of an ephemeris
//!
//! A [`PileUp`] tracks the barycentre of its parts with a
//! [`DiscreteTrajectory`] and republishes the motion of each part as the
//! barycentre plus the fixed offset of the part. Without an intrinsic force
//! the barycentre is flowed with the fixed-step integrator, and the last
//! partial step up to the requested time is completed with the adaptive one;
//! that final point is not on the step grid, so it is replaced by the next
//! call to [`PileUp::advance_time`].

use crate::geometry::{BarycentreCalculator, DegreesOfFreedom, RelativeDegreesOfFreedom};
use crate::physics::{
    no_intrinsic_acceleration, AdaptiveStepParameters, DiscreteTrajectory, Ephemeris,
    EphemerisError, FixedStepParameters,
};
use crate::time::Instant;
use log::trace;
use nalgebra::Vector3;

/// A member of a pile-up, with its own published trajectory
#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    mass: f64,
    offset: RelativeDegreesOfFreedom,
    trajectory: DiscreteTrajectory,
}

impl Part {
    /// A part with the given mass (kg) and initial degrees of freedom
    ///
    /// # Panics
    ///
    /// Panics unless `mass > 0`.
    pub fn new(
        name: impl Into<String>,
        mass: f64,
        time: Instant,
        degrees_of_freedom: DegreesOfFreedom,
    ) -> Self {
        assert!(mass > 0.0, "part mass must be positive, got {mass}");
        let mut trajectory = DiscreteTrajectory::new();
        trajectory.append(time, degrees_of_freedom);
        Self {
            name: name.into(),
            mass,
            offset: DegreesOfFreedom::new(Vector3::zeros(), Vector3::zeros()),
            trajectory,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Position and velocity relative to the barycentre of the pile-up
    pub fn offset(&self) -> RelativeDegreesOfFreedom {
        self.offset
    }

    pub fn trajectory(&self) -> &DiscreteTrajectory {
        &self.trajectory
    }
}

/// Parts moving together as a rigid, non-rotating body
#[derive(Debug, Clone)]
pub struct PileUp {
    parts: Vec<Part>,
    mass: f64,
    intrinsic_force: Vector3<f64>,
    /// Motion of the barycentre
    trajectory: DiscreteTrajectory,
    /// False when the last point of `trajectory` comes from the adaptive
    /// completion of a partial step
    last_point_is_authoritative: bool,
}

impl PileUp {
    /// Group `parts`, which must all end at the same time
    ///
    /// # Panics
    ///
    /// Panics if `parts` is empty or if their trajectories end at different
    /// times.
    pub fn new(mut parts: Vec<Part>) -> Self {
        assert!(!parts.is_empty(), "a pile-up needs at least one part");
        let mut time = None;
        let mut barycentre = BarycentreCalculator::new();
        for part in &parts {
            let Some(last) = part.trajectory.last() else {
                panic!("part {} has an empty trajectory", part.name);
            };
            match time {
                None => time = Some(last.time),
                Some(time) => assert_eq!(
                    time, last.time,
                    "the parts of a pile-up must all end at the same time"
                ),
            }
            barycentre.add(&last.degrees_of_freedom, part.mass);
        }
        let barycentre_degrees_of_freedom = barycentre.get();
        for part in &mut parts {
            if let Some(last) = part.trajectory.last() {
                part.offset = last.degrees_of_freedom - barycentre_degrees_of_freedom;
            }
        }

        let mut trajectory = DiscreteTrajectory::new();
        if let Some(time) = time {
            trajectory.append(time, barycentre_degrees_of_freedom);
        }
        Self {
            parts,
            mass: barycentre.weight(),
            intrinsic_force: Vector3::zeros(),
            trajectory,
            last_point_is_authoritative: true,
        }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Total mass in kilograms
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Force applied to the pile-up besides gravity, in newtons
    pub fn intrinsic_force(&self) -> Vector3<f64> {
        self.intrinsic_force
    }

    /// Motion of the barycentre
    pub fn trajectory(&self) -> &DiscreteTrajectory {
        &self.trajectory
    }

    pub fn last_point_is_authoritative(&self) -> bool {
        self.last_point_is_authoritative
    }

    /// # Panics
    ///
    /// Panics unless `mass > 0`.
    pub fn set_mass_and_intrinsic_force(&mut self, mass: f64, intrinsic_force: Vector3<f64>) {
        assert!(mass > 0.0, "pile-up mass must be positive, got {mass}");
        self.mass = mass;
        self.intrinsic_force = intrinsic_force;
    }

    /// Flow the pile-up to `t` and publish the new points of its parts
    ///
    /// If the adaptive integration runs out of steps, the points reached are
    /// still published and the error is returned.
    pub fn advance_time(
        &mut self,
        ephemeris: &mut Ephemeris,
        t: Instant,
        fixed_step_parameters: &FixedStepParameters,
        adaptive_step_parameters: &AdaptiveStepParameters,
    ) -> Result<(), EphemerisError> {
        if !self.last_point_is_authoritative {
            self.forget_last_point();
        }
        let first_new_point = self.trajectory.len();

        let result = if self.intrinsic_force == Vector3::zeros() {
            ephemeris.flow_with_fixed_step(
                &mut [&mut self.trajectory],
                &[&no_intrinsic_acceleration],
                t,
                fixed_step_parameters,
            );
            self.complete_last_step(ephemeris, t, adaptive_step_parameters)
        } else {
            let acceleration = self.intrinsic_force / self.mass;
            ephemeris.flow_with_adaptive_step(
                &mut self.trajectory,
                &move |_: Instant| acceleration,
                t,
                adaptive_step_parameters,
            )
        };

        self.publish_points_from(first_new_point);
        result
    }

    /// Reach `t` from the last point on the step grid with the adaptive
    /// integrator, keeping only the final point
    fn complete_last_step(
        &mut self,
        ephemeris: &mut Ephemeris,
        t: Instant,
        adaptive_step_parameters: &AdaptiveStepParameters,
    ) -> Result<(), EphemerisError> {
        let Some(&last) = self.trajectory.last() else {
            return Ok(());
        };
        if last.time >= t {
            return Ok(());
        }
        let mut prolongation = DiscreteTrajectory::new();
        prolongation.append(last.time, last.degrees_of_freedom);
        let result = ephemeris.flow_with_adaptive_step(
            &mut prolongation,
            &no_intrinsic_acceleration,
            t,
            adaptive_step_parameters,
        );
        if let Some(end) = prolongation.last() {
            if end.time > last.time {
                self.trajectory.append(end.time, end.degrees_of_freedom);
                self.last_point_is_authoritative = false;
            }
        }
        result
    }

    fn forget_last_point(&mut self) {
        let points = self.trajectory.points();
        if points.len() >= 2 {
            let penultimate = points[points.len() - 2].time;
            self.trajectory.forget_after(penultimate);
            for part in &mut self.parts {
                part.trajectory.forget_after(penultimate);
            }
        }
        self.last_point_is_authoritative = true;
    }

    fn publish_points_from(&mut self, first_new_point: usize) {
        let new_points = &self.trajectory.points()[first_new_point..];
        for point in new_points {
            for part in &mut self.parts {
                part.trajectory
                    .append(point.time, point.degrees_of_freedom + part.offset);
            }
        }
        trace!(
            "Pile-up of {} parts published {} points up to {:?}",
            self.parts.len(),
            new_points.len(),
            self.trajectory.last().map(|point| point.time)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrators::{DormandPrince54, RungeKutta4};
    use crate::physics::{FittingTolerances, MassiveBody, UNLIMITED_MAX_EPHEMERIS_STEPS};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn central_body() -> Ephemeris {
        Ephemeris::new(
            vec![MassiveBody::new("Centre", 1.0)],
            vec![DegreesOfFreedom::new(Vector3::zeros(), Vector3::zeros())],
            Instant::J2000,
            FixedStepParameters::new(Arc::new(RungeKutta4), 0.1),
            FittingTolerances::new(1e-9, 1e-6),
        )
    }

    fn parameters() -> (FixedStepParameters, AdaptiveStepParameters) {
        (
            FixedStepParameters::new(Arc::new(RungeKutta4), 0.1),
            AdaptiveStepParameters::new(
                Arc::new(DormandPrince54),
                UNLIMITED_MAX_EPHEMERIS_STEPS,
                1e-9,
                1e-9,
            ),
        )
    }

    fn two_part_pile_up() -> PileUp {
        let speed = 0.1_f64.sqrt();
        PileUp::new(vec![
            Part::new(
                "Capsule",
                1.0,
                Instant::J2000,
                DegreesOfFreedom::new(Vector3::new(10.0, 0.5, 0.0), Vector3::new(0.0, speed, 0.0)),
            ),
            Part::new(
                "Service module",
                3.0,
                Instant::J2000,
                DegreesOfFreedom::new(Vector3::new(10.0, -0.5, 0.0), Vector3::new(0.0, speed, 0.0)),
            ),
        ])
    }

    #[test]
    fn test_barycentre_and_offsets() {
        let pile_up = two_part_pile_up();
        assert_eq!(pile_up.mass(), 4.0);
        let barycentre = pile_up.trajectory().last().unwrap().degrees_of_freedom;
        assert_relative_eq!(barycentre.position(), Vector3::new(10.0, -0.25, 0.0));
        assert_relative_eq!(pile_up.parts()[0].offset().position(), Vector3::new(0.0, 0.75, 0.0));
        assert_relative_eq!(pile_up.parts()[1].offset().position(), Vector3::new(0.0, -0.25, 0.0));
    }

    #[test]
    fn test_free_fall_replaces_the_non_authoritative_point() {
        let mut ephemeris = central_body();
        let mut pile_up = two_part_pile_up();
        let (fixed, adaptive) = parameters();

        let t1 = Instant::from_seconds_since_j2000(1.05);
        pile_up.advance_time(&mut ephemeris, t1, &fixed, &adaptive).unwrap();
        assert_eq!(pile_up.trajectory().len(), 12);
        assert_eq!(pile_up.trajectory().last().unwrap().time, t1);
        assert!(!pile_up.last_point_is_authoritative());

        let t2 = Instant::from_seconds_since_j2000(2.05);
        pile_up.advance_time(&mut ephemeris, t2, &fixed, &adaptive).unwrap();
        assert_eq!(pile_up.trajectory().len(), 22);
        assert_eq!(pile_up.trajectory().last().unwrap().time, t2);
        assert!(pile_up
            .trajectory()
            .iter()
            .all(|point| point.time != t1));

        for part in pile_up.parts() {
            assert_eq!(part.trajectory().len(), pile_up.trajectory().len());
            for (part_point, point) in part.trajectory().iter().zip(pile_up.trajectory()) {
                assert_eq!(part_point.time, point.time);
                assert_relative_eq!(
                    part_point.degrees_of_freedom.position(),
                    point.degrees_of_freedom.position() + part.offset().position(),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_thrust_lands_on_the_requested_time() {
        let mut ephemeris = central_body();
        let mut pile_up = two_part_pile_up();
        let (fixed, adaptive) = parameters();
        pile_up.set_mass_and_intrinsic_force(4.0, Vector3::new(0.0, 0.4, 0.0));

        let t = Instant::from_seconds_since_j2000(1.05);
        pile_up.advance_time(&mut ephemeris, t, &fixed, &adaptive).unwrap();
        assert_eq!(pile_up.trajectory().last().unwrap().time, t);
        assert!(pile_up.last_point_is_authoritative());

        // Faster than free fall along the thrust
        let mut coasting = two_part_pile_up();
        coasting.advance_time(&mut ephemeris, t, &fixed, &adaptive).unwrap();
        let thrusting_velocity = pile_up.trajectory().last().unwrap().degrees_of_freedom.velocity();
        let coasting_velocity = coasting.trajectory().last().unwrap().degrees_of_freedom.velocity();
        assert_relative_eq!(thrusting_velocity.y - coasting_velocity.y, 0.105, epsilon = 1e-3);
    }
}
