//! Constants module for ephemeris calculations

use std::f64::consts::PI;

// Astronomical distances
/// Astronomical Unit in meters (per IAU 2012 Resolution B2)
pub const AU_M: f64 = 149_597_870_700.0;

// Time constants
/// Seconds in a day
pub const DAY_S: f64 = 86_400.0;
/// J2000.0 epoch as Julian date
pub const J2000: f64 = 2_451_545.0;
/// Days in a Julian year
pub const JULIAN_YEAR_DAYS: f64 = 365.25;

// Angles
/// Degrees to radians conversion factor
pub const DEG2RAD: f64 = PI / 180.0;
/// Tau (2*PI) for full circle
pub const TAU: f64 = 2.0 * PI;

// Physics
/// Newtonian constant of gravitation in m^3/(kg s^2) (CODATA 2018)
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674_30e-11;
/// Heliocentric gravitational constant in m^3/s^2
pub const GM_SUN: f64 = 1.327_124_400_18e20;
/// Geocentric gravitational constant in m^3/s^2
pub const GM_EARTH: f64 = 3.986_004_418e14;
/// Selenocentric gravitational constant in m^3/s^2
pub const GM_MOON: f64 = 4.902_800_066e12;
/// Gravitational constant of Mars in m^3/s^2
pub const GM_MARS: f64 = 4.282_837e13;
/// Gravitational constant of Jupiter in m^3/s^2
pub const GM_JUPITER: f64 = 1.266_865_34e17;
