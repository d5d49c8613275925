//! Time module for the ephemeris timeline
//!
//! Every trajectory in this crate shares a single timeline. Points on it are
//! [`Instant`]s, counted in TDB seconds from the J2000 epoch; the difference of
//! two instants is a plain `f64` duration in seconds. Keeping instants and
//! durations as distinct types means that adding two instants, or passing an
//! instant where a step size is expected, does not compile.

use crate::constants::{DAY_S, J2000};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A point on the global timeline, in TDB seconds since J2000
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, serde::Serialize, serde::Deserialize)]
pub struct Instant(f64);

impl Instant {
    /// The J2000 epoch
    pub const J2000: Instant = Instant(0.0);

    /// Create an instant from TDB seconds since J2000
    pub const fn from_seconds_since_j2000(seconds: f64) -> Self {
        Instant(seconds)
    }

    /// Create an instant from a (TDB) Julian date
    pub fn from_julian_date(jd: f64) -> Self {
        Instant((jd - J2000) * DAY_S)
    }

    /// TDB seconds since J2000
    pub fn seconds_since_j2000(&self) -> f64 {
        self.0
    }

    /// The (TDB) Julian date of this instant
    pub fn julian_date(&self) -> f64 {
        J2000 + self.0 / DAY_S
    }

    /// Total order on instants; instants are never NaN on a valid timeline.
    pub fn total_cmp(&self, other: &Instant) -> Ordering {
        self.0.total_cmp(&other.0)
    }

    /// The later of two instants
    pub fn max(self, other: Instant) -> Instant {
        if other > self {
            other
        } else {
            self
        }
    }

    /// The earlier of two instants
    pub fn min(self, other: Instant) -> Instant {
        if other < self {
            other
        } else {
            self
        }
    }

    /// The instant halfway between `self` and `other`
    pub fn midpoint(self, other: Instant) -> Instant {
        Instant(self.0 + (other.0 - self.0) / 2.0)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "J2000{:+.3}s", self.0)
    }
}

impl Add<f64> for Instant {
    type Output = Instant;

    fn add(self, seconds: f64) -> Self::Output {
        Instant(self.0 + seconds)
    }
}

impl AddAssign<f64> for Instant {
    fn add_assign(&mut self, seconds: f64) {
        self.0 += seconds;
    }
}

impl Sub<f64> for Instant {
    type Output = Instant;

    fn sub(self, seconds: f64) -> Self::Output {
        Instant(self.0 - seconds)
    }
}

impl SubAssign<f64> for Instant {
    fn sub_assign(&mut self, seconds: f64) {
        self.0 -= seconds;
    }
}

impl Sub<Instant> for Instant {
    type Output = f64;

    fn sub(self, other: Instant) -> Self::Output {
        // Duration in seconds
        self.0 - other.0
    }
}
