use crate::geometry::DegreesOfFreedom;
use crate::time::Instant;

/// One sample of a trajectory
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    pub time: Instant,
    pub degrees_of_freedom: DegreesOfFreedom,
}

impl TrajectoryPoint {
    pub fn new(time: Instant, degrees_of_freedom: DegreesOfFreedom) -> Self {
        Self {
            time,
            degrees_of_freedom,
        }
    }
}

/// A time-ordered list of samples, as produced by integrating a massless body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscreteTrajectory {
    points: Vec<TrajectoryPoint>,
}

impl DiscreteTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample
    ///
    /// # Panics
    ///
    /// Panics unless `time` is after the last sample.
    pub fn append(&mut self, time: Instant, degrees_of_freedom: DegreesOfFreedom) {
        if let Some(last) = self.points.last() {
            assert!(
                time > last.time,
                "cannot append at {time}, trajectory already ends at {}",
                last.time
            );
        }
        self.points.push(TrajectoryPoint::new(time, degrees_of_freedom));
    }

    pub fn first(&self) -> Option<&TrajectoryPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrajectoryPoint> {
        self.points.iter()
    }

    /// Remove the samples after `time`
    pub fn forget_after(&mut self, time: Instant) {
        let keep = self.points.partition_point(|point| point.time <= time);
        self.points.truncate(keep);
    }

    /// Remove the samples before `time`
    pub fn forget_before(&mut self, time: Instant) {
        let first_kept = self.points.partition_point(|point| point.time < time);
        self.points.drain(..first_kept);
    }
}

impl<'a> IntoIterator for &'a DiscreteTrajectory {
    type Item = &'a TrajectoryPoint;
    type IntoIter = std::slice::Iter<'a, TrajectoryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
