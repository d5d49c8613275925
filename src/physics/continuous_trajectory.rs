//! Piecewise-polynomial trajectory of one massive body
//!
//! A [`ContinuousTrajectory`] receives the samples produced by the planetary
//! integrator, one per step, and folds them into Chebyshev pieces as soon as
//! [`DIVISIONS`] steps are available. Pieces are contiguous: each one starts
//! at the last sample of its predecessor, and position and velocity are
//! continuous across the junction. Samples not yet folded into a piece (the
//! tail) answer queries by cubic Hermite interpolation.

use crate::geometry::DegreesOfFreedom;
use crate::numerics::{
    fit_hermite_spline, newhall_approximation_in_chebyshev_basis, ChebyshevSeries, Hermite3,
    NewhallApproximation,
};
use crate::physics::discrete_trajectory::TrajectoryPoint;
use crate::time::Instant;
use log::{debug, trace, warn};
use nalgebra::Vector3;

/// Number of steps covered by a piece fitted over the whole tail
pub const DIVISIONS: usize = 8;
/// Lowest degree of a fitted piece
pub const MIN_DEGREE: usize = 3;
/// Highest degree of a fitted piece
pub const MAX_DEGREE: usize = 17;
/// Number of pieces after which the preferred degree is reset to [`MIN_DEGREE`]
const MAX_DEGREE_AGE: usize = 100;
/// Relative deviation of the sample spacing from the step that is tolerated
const SPACING_TOLERANCE: f64 = 1e-6;
/// Deviation of the sample spacing tolerated in ulps of the sample time
const SPACING_ULPS: f64 = 4.0;

/// Which of the two fitting tolerances a piece met
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FittingTolerance {
    Low,
    High,
}

/// Low and high fitting tolerances, in metres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittingTolerances {
    pub low: f64,
    pub high: f64,
}

impl FittingTolerances {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

/// A committed Chebyshev piece
#[derive(Debug, Clone)]
pub struct PolynomialPiece {
    series: ChebyshevSeries,
    error_estimate: f64,
    tolerance: FittingTolerance,
}

impl PolynomialPiece {
    pub fn t_min(&self) -> Instant {
        self.series.t_min()
    }

    pub fn t_max(&self) -> Instant {
        self.series.t_max()
    }

    pub fn degree(&self) -> usize {
        self.series.degree()
    }

    /// The error estimate that justified the degree and interval of this piece
    pub fn error_estimate(&self) -> f64 {
        self.error_estimate
    }

    pub fn tolerance(&self) -> FittingTolerance {
        self.tolerance
    }

    pub fn series(&self) -> &ChebyshevSeries {
        &self.series
    }
}

/// Fitted representation of the trajectory of one body
#[derive(Debug, Clone)]
pub struct ContinuousTrajectory {
    step: f64,
    low_fitting_tolerance: f64,
    high_fitting_tolerance: f64,
    pieces: Vec<PolynomialPiece>,
    /// Samples not yet covered by a piece; the first one is the end of the
    /// last piece, if any
    tail: Vec<TrajectoryPoint>,
    /// Set by `forget_before` when it moves `t_min` inside a piece or the tail
    forgotten_before: Option<Instant>,
    /// Degree at which the next fit starts
    degree: usize,
    /// Number of pieces fitted since `degree` was last reset
    degree_age: usize,
}

impl ContinuousTrajectory {
    /// Create an empty trajectory for samples spaced by `step` seconds
    ///
    /// # Panics
    ///
    /// Panics unless `step` and the tolerances are positive with
    /// `low_fitting_tolerance <= high_fitting_tolerance`.
    pub fn new(step: f64, low_fitting_tolerance: f64, high_fitting_tolerance: f64) -> Self {
        assert!(step > 0.0, "trajectory step must be positive, got {step}");
        assert!(
            low_fitting_tolerance > 0.0 && low_fitting_tolerance <= high_fitting_tolerance,
            "invalid fitting tolerances: low {low_fitting_tolerance}, high {high_fitting_tolerance}"
        );
        Self {
            step,
            low_fitting_tolerance,
            high_fitting_tolerance,
            pieces: Vec::new(),
            tail: Vec::new(),
            forgotten_before: None,
            degree: MIN_DEGREE,
            degree_age: 0,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn fitting_tolerances(&self) -> FittingTolerances {
        FittingTolerances::new(self.low_fitting_tolerance, self.high_fitting_tolerance)
    }

    pub fn is_empty(&self) -> bool {
        self.tail.is_empty()
    }

    /// Committed pieces, in time order
    pub fn pieces(&self) -> &[PolynomialPiece] {
        &self.pieces
    }

    /// Number of samples not yet covered by a piece (including the shared
    /// endpoint of the last piece)
    pub fn tail_len(&self) -> usize {
        self.tail.len()
    }

    /// Degree at which the next fit starts
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The most recently appended sample
    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.tail.last()
    }

    /// Start of the valid range; `+∞` for an empty trajectory
    pub fn t_min(&self) -> Instant {
        let natural = match (self.pieces.first(), self.tail.first()) {
            (Some(piece), _) => piece.t_min(),
            (None, Some(point)) => point.time,
            (None, None) => return Instant::from_seconds_since_j2000(f64::INFINITY),
        };
        match self.forgotten_before {
            Some(t) => natural.max(t),
            None => natural,
        }
    }

    /// End of the valid range (the last appended time); `-∞` for an empty
    /// trajectory
    pub fn t_max(&self) -> Instant {
        self.tail
            .last()
            .map(|point| point.time)
            .unwrap_or(Instant::from_seconds_since_j2000(f64::NEG_INFINITY))
    }

    /// Append a sample and fit a new piece when the tail is long enough
    ///
    /// # Panics
    ///
    /// Panics unless `time` is after the last sample by one step.
    pub fn append(&mut self, time: Instant, degrees_of_freedom: DegreesOfFreedom) {
        if let Some(last) = self.tail.last() {
            assert!(
                time > last.time,
                "cannot append at {time}, trajectory already ends at {}",
                last.time
            );
            let spacing = time - last.time;
            // Far from J2000 the difference of two sample times is only
            // known to an ulp of the times themselves.
            let tolerance = (SPACING_TOLERANCE * self.step)
                .max(SPACING_ULPS * f64::EPSILON * time.seconds_since_j2000().abs());
            assert!(
                (spacing - self.step).abs() <= tolerance,
                "samples must be spaced by {} s, got {spacing} s at {time}",
                self.step
            );
        }
        self.tail.push(TrajectoryPoint::new(time, degrees_of_freedom));
        if self.tail.len() > DIVISIONS {
            self.fit_tail();
        }
    }

    pub fn evaluate_position(&self, t: Instant) -> Vector3<f64> {
        self.evaluate_degrees_of_freedom(t).position()
    }

    pub fn evaluate_velocity(&self, t: Instant) -> Vector3<f64> {
        self.evaluate_degrees_of_freedom(t).velocity()
    }

    /// Position and velocity at `t`
    ///
    /// # Panics
    ///
    /// Panics unless `t_min() <= t <= t_max()`.
    pub fn evaluate_degrees_of_freedom(&self, t: Instant) -> DegreesOfFreedom {
        assert!(
            self.t_min() <= t && t <= self.t_max(),
            "{t} is outside the trajectory range [{}, {}]",
            self.t_min(),
            self.t_max()
        );
        if t >= self.tail[0].time {
            return self.evaluate_tail(t);
        }
        let index = self.pieces.partition_point(|piece| piece.t_max() <= t);
        let series = &self.pieces[index].series;
        DegreesOfFreedom::new(series.evaluate(t), series.evaluate_derivative(t))
    }

    /// Drop the data needed only for queries before `t`
    ///
    /// # Panics
    ///
    /// Panics unless `t <= t_max()`.
    pub fn forget_before(&mut self, t: Instant) {
        assert!(
            t <= self.t_max(),
            "cannot forget before {t}, trajectory ends at {}",
            self.t_max()
        );
        if t <= self.t_min() {
            return;
        }

        let first_kept = self.pieces.partition_point(|piece| piece.t_max() <= t);
        self.pieces.drain(..first_kept);
        if self.pieces.is_empty() {
            // Keep the last sample at or before t to interpolate from.
            let keep_from = self
                .tail
                .partition_point(|point| point.time <= t)
                .saturating_sub(1);
            self.tail.drain(..keep_from);
        }
        self.forgotten_before = Some(t);
        trace!(
            "Forgot before {t}: {} pieces and {} tail samples remain",
            self.pieces.len(),
            self.tail.len()
        );
    }

    fn evaluate_tail(&self, t: Instant) -> DegreesOfFreedom {
        let upper = self.tail.partition_point(|point| point.time <= t);
        if upper == self.tail.len() {
            // t is the last sample.
            return self.tail[upper - 1].degrees_of_freedom;
        }
        let before = &self.tail[upper - 1];
        let after = &self.tail[upper];
        let hermite = Hermite3::new(
            (before.time, after.time),
            (
                before.degrees_of_freedom.position(),
                after.degrees_of_freedom.position(),
            ),
            (
                before.degrees_of_freedom.velocity(),
                after.degrees_of_freedom.velocity(),
            ),
        );
        DegreesOfFreedom::new(hermite.evaluate(t), hermite.evaluate_derivative(t))
    }

    fn fit_tail(&mut self) {
        let positions: Vec<Vector3<f64>> = self
            .tail
            .iter()
            .map(|point| point.degrees_of_freedom.position())
            .collect();
        let velocities: Vec<Vector3<f64>> = self
            .tail
            .iter()
            .map(|point| point.degrees_of_freedom.velocity())
            .collect();

        if let Some((approximation, tolerance)) =
            self.best_newhall_approximation(&positions, &velocities)
        {
            let end = self.tail.len() - 1;
            let error_estimate = approximation.error_estimate;
            self.commit(approximation.series, error_estimate, tolerance, end);
            return;
        }

        // No polynomial over the whole tail is accurate enough: fall back to
        // the cubic over the first interval of a Hermite spline.
        let (end, tolerance) = self.split_tail();
        let approximation = newhall_approximation_in_chebyshev_basis(
            MIN_DEGREE,
            &positions[..=end],
            &velocities[..=end],
            self.tail[0].time,
            self.tail[end].time,
        );
        match approximation {
            Ok(approximation) => {
                let error_estimate = approximation.sample_error;
                self.commit(approximation.series, error_estimate, tolerance, end);
            }
            // The cubic is fully determined by its endpoints; keep the
            // samples in the tail if even that fails.
            Err(error) => warn!("Cannot fit the trajectory tail: {error}"),
        }
    }

    /// Escalate the degree from the preferred one until the low tolerance is
    /// met, falling back to the most accurate degree if it meets the high one
    fn best_newhall_approximation(
        &mut self,
        positions: &[Vector3<f64>],
        velocities: &[Vector3<f64>],
    ) -> Option<(NewhallApproximation, FittingTolerance)> {
        if self.degree_age >= MAX_DEGREE_AGE {
            self.degree = MIN_DEGREE;
            self.degree_age = 0;
        }
        let t_min = self.tail[0].time;
        let t_max = self.tail[self.tail.len() - 1].time;
        let max_degree = MAX_DEGREE.min(2 * positions.len() - 1);

        let mut best: Option<NewhallApproximation> = None;
        for degree in self.degree.min(max_degree)..=max_degree {
            let approximation = match newhall_approximation_in_chebyshev_basis(
                degree, positions, velocities, t_min, t_max,
            ) {
                Ok(approximation) => approximation,
                Err(error) => {
                    warn!("{error}");
                    continue;
                }
            };
            if approximation.error_estimate <= self.low_fitting_tolerance {
                if degree != self.degree {
                    debug!(
                        "Fitting degree raised from {} to {degree} at {t_min}",
                        self.degree
                    );
                }
                self.degree = degree;
                return Some((approximation, FittingTolerance::Low));
            }
            if best
                .as_ref()
                .map_or(true, |best| approximation.error_estimate < best.error_estimate)
            {
                best = Some(approximation);
            }
        }

        let best = best.filter(|best| best.error_estimate <= self.high_fitting_tolerance)?;
        debug!(
            "Low tolerance {} m not met at {t_min}, degree {} reaches {} m",
            self.low_fitting_tolerance,
            best.series.degree(),
            best.error_estimate
        );
        self.degree = best.series.degree();
        Some((best, FittingTolerance::High))
    }

    /// Index of the last tail sample of the next piece, and the tolerance it meets
    fn split_tail(&self) -> (usize, FittingTolerance) {
        let whole_tail = self.tail.len() - 1;
        let breakpoints = |tolerance: f64| {
            fit_hermite_spline(
                &self.tail,
                |point: &TrajectoryPoint| point.time,
                |point: &TrajectoryPoint| point.degrees_of_freedom.position(),
                |point: &TrajectoryPoint| point.degrees_of_freedom.velocity(),
                tolerance,
            )
        };
        match breakpoints(self.low_fitting_tolerance).first() {
            None => (whole_tail, FittingTolerance::Low),
            Some(&end) if end >= 2 => (end, FittingTolerance::Low),
            Some(_) => {
                let end = breakpoints(self.high_fitting_tolerance)
                    .first()
                    .copied()
                    .unwrap_or(whole_tail);
                debug!(
                    "Sparse samples at {}: splitting the tail after {end} steps",
                    self.tail[0].time
                );
                (end, FittingTolerance::High)
            }
        }
    }

    fn commit(
        &mut self,
        series: ChebyshevSeries,
        error_estimate: f64,
        tolerance: FittingTolerance,
        end: usize,
    ) {
        trace!(
            "Piece of degree {} over [{}, {}], error estimate {error_estimate:e} m",
            series.degree(),
            series.t_min(),
            series.t_max()
        );
        self.pieces.push(PolynomialPiece {
            series,
            error_estimate,
            tolerance,
        });
        self.tail.drain(..end);
        self.degree_age += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const RADIUS: f64 = 1.0e9;
    const OMEGA: f64 = 2.0e-6;

    fn circular(t: Instant) -> DegreesOfFreedom {
        let angle = OMEGA * t.seconds_since_j2000();
        DegreesOfFreedom::new(
            Vector3::new(angle.cos(), angle.sin(), 0.0) * RADIUS,
            Vector3::new(-angle.sin(), angle.cos(), 0.0) * (RADIUS * OMEGA),
        )
    }

    fn filled(step: f64, samples: usize, low: f64, high: f64) -> ContinuousTrajectory {
        let mut trajectory = ContinuousTrajectory::new(step, low, high);
        for i in 0..samples {
            let t = Instant::J2000 + i as f64 * step;
            trajectory.append(t, circular(t));
        }
        trajectory
    }

    #[test]
    fn test_empty_trajectory() {
        let trajectory = ContinuousTrajectory::new(1.0, 1.0, 2.0);
        assert!(trajectory.is_empty());
        assert!(trajectory.last().is_none());
        assert!(trajectory.t_min() > trajectory.t_max());
    }

    #[test]
    fn test_growing_until_divisions() {
        let trajectory = filled(3600.0, DIVISIONS, 1.0, 10.0);
        assert!(trajectory.pieces().is_empty());
        assert_eq!(trajectory.tail_len(), DIVISIONS);

        let trajectory = filled(3600.0, DIVISIONS + 1, 1.0, 10.0);
        assert_eq!(trajectory.pieces().len(), 1);
        assert_eq!(trajectory.tail_len(), 1);
        assert_eq!(trajectory.pieces()[0].tolerance(), FittingTolerance::Low);
    }

    #[test]
    fn test_pieces_are_contiguous() {
        let step = 3600.0;
        let trajectory = filled(step, 8 * 20 + 5, 1.0, 10.0);
        let pieces = trajectory.pieces();
        assert_eq!(pieces.len(), 20);
        for pair in pieces.windows(2) {
            assert_eq!(pair[0].t_max(), pair[1].t_min());
        }
        assert_eq!(pieces[0].t_min(), Instant::J2000);
        assert_eq!(pieces[19].t_max(), Instant::J2000 + 160.0 * step);
        assert_eq!(trajectory.tail_len(), 5);
        assert!(trajectory.degree() >= MIN_DEGREE && trajectory.degree() <= MAX_DEGREE);
    }

    #[test]
    fn test_round_trip_at_samples() {
        let step = 3600.0;
        let low = 1.0;
        let trajectory = filled(step, 200, low, 10.0);
        for i in 0..200 {
            let t = Instant::J2000 + i as f64 * step;
            let expected = circular(t);
            let actual = trajectory.evaluate_degrees_of_freedom(t);
            assert!(
                actual.position_distance(&expected) <= low,
                "sample {i} off by {} m",
                actual.position_distance(&expected)
            );
        }
        for piece in trajectory.pieces() {
            assert!(piece.error_estimate() <= low);
        }
    }

    #[test]
    fn test_interpolation_between_samples() {
        let step = 3600.0;
        let trajectory = filled(step, 100, 1.0, 10.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let t = Instant::J2000 + rng.gen_range(0.0..99.0 * step);
            let expected = circular(t);
            assert_relative_eq!(
                trajectory.evaluate_position(t),
                expected.position(),
                epsilon = 10.0
            );
            assert_relative_eq!(
                trajectory.evaluate_velocity(t),
                expected.velocity(),
                epsilon = 1e-3
            );
        }
    }

    #[test]
    fn test_continuity_at_junctions() {
        let step = 3600.0;
        let trajectory = filled(step, 8 * 5 + 1, 1.0, 10.0);
        for pair in trajectory.pieces().windows(2) {
            let junction = pair[0].t_max();
            let left = pair[0].series();
            let right = pair[1].series();
            assert_relative_eq!(left.evaluate(junction), right.evaluate(junction), epsilon = 1e-3);
            assert_relative_eq!(
                left.evaluate_derivative(junction),
                right.evaluate_derivative(junction),
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn test_sparse_samples_split_the_tail() {
        // Ten orbits per step: no polynomial over eight steps comes close.
        let step = 10.0 * std::f64::consts::TAU / OMEGA + 1234.0;
        let mut trajectory = ContinuousTrajectory::new(step, 1.0, 10.0);
        for i in 0..=DIVISIONS {
            let t = Instant::J2000 + i as f64 * step;
            trajectory.append(t, circular(t));
        }
        assert_eq!(trajectory.pieces().len(), 1);
        let piece = &trajectory.pieces()[0];
        assert_eq!(piece.degree(), MIN_DEGREE);
        assert!(piece.t_max() < Instant::J2000 + DIVISIONS as f64 * step);
        assert!(trajectory.tail_len() > 1);
        // The last sample is still reachable.
        let last = trajectory.last().unwrap();
        assert_eq!(
            trajectory.evaluate_degrees_of_freedom(last.time),
            last.degrees_of_freedom
        );
    }

    #[test]
    fn test_forget_before() {
        let step = 3600.0;
        let mut trajectory = filled(step, 8 * 10 + 4, 1.0, 10.0);
        let t_max = trajectory.t_max();

        // No-op below t_min
        trajectory.forget_before(Instant::J2000 - 1.0);
        assert_eq!(trajectory.t_min(), Instant::J2000);
        assert_eq!(trajectory.pieces().len(), 10);

        // Inside the fourth piece
        let t = Instant::J2000 + 27.5 * step;
        trajectory.forget_before(t);
        assert_eq!(trajectory.t_min(), t);
        assert_eq!(trajectory.pieces().len(), 7);
        assert_eq!(trajectory.t_max(), t_max);
        assert_relative_eq!(
            trajectory.evaluate_position(t),
            circular(t).position(),
            epsilon = 10.0
        );

        // Monotonic: an earlier forget changes nothing
        trajectory.forget_before(Instant::J2000 + step);
        assert_eq!(trajectory.t_min(), t);

        // Inside the tail
        let t = Instant::J2000 + 81.5 * step;
        trajectory.forget_before(t);
        assert!(trajectory.pieces().is_empty());
        assert_eq!(trajectory.t_min(), t);
        assert_eq!(trajectory.tail_len(), 3);
        assert_relative_eq!(
            trajectory.evaluate_position(t),
            circular(t).position(),
            epsilon = 10.0
        );

        // Up to the last sample
        trajectory.forget_before(t_max);
        assert_eq!(trajectory.t_min(), t_max);
        assert_eq!(trajectory.tail_len(), 1);
    }

    #[test]
    #[should_panic(expected = "outside the trajectory range")]
    fn test_query_before_t_min() {
        let mut trajectory = filled(3600.0, 30, 1.0, 10.0);
        trajectory.forget_before(Instant::J2000 + 10.0 * 3600.0);
        trajectory.evaluate_position(Instant::J2000 + 9.0 * 3600.0);
    }

    #[test]
    #[should_panic(expected = "cannot forget before")]
    fn test_forget_after_t_max() {
        let mut trajectory = filled(3600.0, 3, 1.0, 10.0);
        trajectory.forget_before(Instant::J2000 + 3.0 * 3600.0);
    }

    #[test]
    fn test_short_step_at_modern_epoch() {
        // 2025-01-01, where an ulp of the time is about 1e-7 s
        let epoch = Instant::from_julian_date(2_460_676.5);
        let step = 0.01;
        let mut trajectory = ContinuousTrajectory::new(step, 1e-3, 1e-1);
        for i in 0..200 {
            let t = epoch + i as f64 * step;
            trajectory.append(t, circular(t));
        }
        assert!(!trajectory.pieces().is_empty());
        let t = epoch + 1.234;
        assert_relative_eq!(
            trajectory.evaluate_position(t),
            circular(t).position(),
            epsilon = 1e-1
        );
    }

    #[test]
    #[should_panic(expected = "samples must be spaced")]
    fn test_append_with_wrong_spacing() {
        let mut trajectory = filled(3600.0, 3, 1.0, 10.0);
        trajectory.append(Instant::J2000 + 3.5 * 3600.0, circular(Instant::J2000));
    }

    #[test]
    #[should_panic(expected = "cannot append")]
    fn test_append_in_the_past() {
        let mut trajectory = filled(3600.0, 3, 1.0, 10.0);
        trajectory.append(Instant::J2000, circular(Instant::J2000));
    }
}
