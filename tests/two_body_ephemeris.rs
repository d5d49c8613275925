//! The ephemeris of a two-body system against the closed-form Kepler orbit

use std::sync::Arc;

use approx::assert_relative_eq;
use nalgebra::Vector3;
use orrery::catalog::{solar_system, EphemerisParameters, SimulationConfig};
use orrery::constants::{AU_M, DAY_S, GM_EARTH, GM_SUN};
use orrery::geometry::DegreesOfFreedom;
use orrery::integrators::{DormandPrince54, RungeKutta4};
use orrery::numerics::error_metrics::{absolute_error, relative_error};
use orrery::physics::{
    AdaptiveStepParameters, Ephemeris, FittingTolerances, FixedStepParameters, KeplerOrbit,
    KeplerianElements, MassiveBody, UNLIMITED_MAX_EPHEMERIS_STEPS,
};
use orrery::pile_up::{Part, PileUp};
use orrery::time::Instant;
use rstest::rstest;

fn sun_and_planet(eccentricity: f64) -> (Ephemeris, KeplerOrbit) {
    let sun = MassiveBody::new("Sun", GM_SUN);
    let planet = MassiveBody::new("Planet", GM_EARTH);
    let orbit = KeplerOrbit::new(
        &sun,
        Some(&planet),
        Instant::J2000,
        KeplerianElements {
            semimajor_axis: AU_M,
            eccentricity,
            inclination: 0.1,
            longitude_of_ascending_node: 0.2,
            argument_of_periapsis: 0.3,
            mean_anomaly: 0.4,
        },
    )
    .unwrap();

    let planet_state = orbit.barycentric_state_vectors(Instant::J2000);
    let ratio = GM_EARTH / GM_SUN;
    let sun_state = DegreesOfFreedom::new(
        -planet_state.position() * ratio,
        -planet_state.velocity() * ratio,
    );
    let ephemeris = Ephemeris::new(
        vec![sun, planet],
        vec![sun_state, planet_state],
        Instant::J2000,
        FixedStepParameters::new(Arc::new(RungeKutta4), 3600.0),
        FittingTolerances::new(1.0, 100.0),
    );
    (ephemeris, orbit)
}

#[rstest]
#[case::circular(0.0)]
#[case::eccentric(0.2)]
fn test_ephemeris_follows_kepler_orbit(#[case] eccentricity: f64) {
    let (mut ephemeris, orbit) = sun_and_planet(eccentricity);
    let t_final = Instant::J2000 + 60.0 * DAY_S;
    ephemeris.prolong(t_final);
    assert!(ephemeris.t_max() >= t_final);

    let planet = ephemeris.body_id("Planet").unwrap();
    let trajectory = ephemeris.trajectory(planet);
    assert!(!trajectory.pieces().is_empty());
    for piece in trajectory.pieces() {
        assert!(piece.error_estimate() <= 100.0);
    }

    // Sample between the integration steps
    let mut t = Instant::J2000 + 1234.5;
    while t <= t_final {
        let expected = orbit.barycentric_state_vectors(t);
        let actual = trajectory.evaluate_degrees_of_freedom(t);
        let position_error = absolute_error(expected.position(), actual.position());
        assert!(position_error < 200.0, "position off by {position_error} m at {t}");
        let velocity_error = relative_error(expected.velocity(), actual.velocity());
        assert!(velocity_error < 1e-6, "velocity off by {velocity_error} (relative) at {t}");
        t += 0.7 * DAY_S;
    }
}

#[test]
fn test_forget_before_keeps_the_range_consistent() {
    let (mut ephemeris, _) = sun_and_planet(0.0);
    ephemeris.prolong(Instant::J2000 + 20.0 * DAY_S);
    let t_max = ephemeris.t_max();

    let t = Instant::J2000 + 5.5 * DAY_S;
    ephemeris.forget_before(t);
    assert!(ephemeris.t_min() >= t);
    assert!(ephemeris.t_min() <= ephemeris.t_max());
    assert_eq!(ephemeris.t_max(), t_max);

    // Still queryable over what is left, and prolongable
    let planet = ephemeris.body_id("Planet").unwrap();
    let position = ephemeris.trajectory(planet).evaluate_position(t);
    assert_relative_eq!(position.norm(), AU_M, max_relative = 1e-5);
    ephemeris.prolong(Instant::J2000 + 30.0 * DAY_S);
    assert!(ephemeris.t_max() >= Instant::J2000 + 30.0 * DAY_S);
}

#[test]
#[should_panic]
fn test_query_before_forgotten_time_panics() {
    let (mut ephemeris, _) = sun_and_planet(0.0);
    ephemeris.prolong(Instant::J2000 + 20.0 * DAY_S);
    ephemeris.forget_before(Instant::J2000 + 5.0 * DAY_S);
    let planet = ephemeris.body_id("Planet").unwrap();
    ephemeris
        .trajectory(planet)
        .evaluate_position(Instant::J2000 + 4.0 * DAY_S);
}

#[test]
fn test_pile_up_in_low_earth_orbit() {
    let config = SimulationConfig::new(solar_system().unwrap(), EphemerisParameters::default());
    let mut ephemeris = config.build_ephemeris().unwrap();
    let earth = ephemeris.body_id("Earth").unwrap();
    let t0 = ephemeris.t_min();
    let earth_state = ephemeris.trajectory(earth).evaluate_degrees_of_freedom(t0);

    let radius = 7.0e6;
    let speed = (GM_EARTH / radius).sqrt();
    let spacecraft = earth_state
        + DegreesOfFreedom::new(Vector3::new(radius, 0.0, 0.0), Vector3::new(0.0, speed, 0.0));
    let mut pile_up = PileUp::new(vec![Part::new("Spacecraft", 1_000.0, t0, spacecraft)]);

    let fixed = FixedStepParameters::new(Arc::new(RungeKutta4), 10.0);
    let adaptive = AdaptiveStepParameters::new(
        Arc::new(DormandPrince54),
        UNLIMITED_MAX_EPHEMERIS_STEPS,
        1e-3,
        1e-6,
    );
    let t = t0 + 3605.0;
    pile_up
        .advance_time(&mut ephemeris, t, &fixed, &adaptive)
        .unwrap();

    let last = pile_up.parts()[0].trajectory().last().unwrap();
    assert_eq!(last.time, t);
    let altitude = last
        .degrees_of_freedom
        .position_distance(&ephemeris.trajectory(earth).evaluate_degrees_of_freedom(t));
    assert_relative_eq!(altitude, radius, max_relative = 1e-3);
}
