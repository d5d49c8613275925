//! Built-in approximate solar system at J2000
//!
//! Mean ecliptic elements of the Earth-Moon barycentre, Mars and Jupiter
//! (Standish's approximate planetary elements) and of the Moon around the
//! Earth. The bodies are placed with [`KeplerOrbit`] around the Sun and then
//! shifted so that the barycentre of the system is at rest at the origin.
//! Good to a few thousandths of an AU, which is plenty for exercising the
//! ephemeris but not for astrometry.

use crate::catalog::{BodyCatalog, Result};
use crate::constants::{AU_M, DEG2RAD, GM_EARTH, GM_JUPITER, GM_MARS, GM_MOON, GM_SUN};
use crate::geometry::{BarycentreCalculator, DegreesOfFreedom};
use crate::physics::{KeplerOrbit, KeplerianElements, MassiveBody};
use crate::time::Instant;
use nalgebra::Vector3;

/// Elements from a semimajor axis in metres and angles in degrees
fn elements(
    semimajor_axis: f64,
    eccentricity: f64,
    inclination: f64,
    longitude_of_ascending_node: f64,
    argument_of_periapsis: f64,
    mean_anomaly: f64,
) -> KeplerianElements {
    KeplerianElements {
        semimajor_axis,
        eccentricity,
        inclination: inclination * DEG2RAD,
        longitude_of_ascending_node: longitude_of_ascending_node * DEG2RAD,
        argument_of_periapsis: argument_of_periapsis * DEG2RAD,
        mean_anomaly: mean_anomaly * DEG2RAD,
    }
}

/// Sun, Earth, Moon, Mars and Jupiter at J2000
pub fn solar_system() -> Result<BodyCatalog> {
    let epoch = Instant::J2000;
    let sun = MassiveBody::new("Sun", GM_SUN);
    let earth = MassiveBody::new("Earth", GM_EARTH);
    let moon = MassiveBody::new("Moon", GM_MOON);
    let mars = MassiveBody::new("Mars", GM_MARS);
    let jupiter = MassiveBody::new("Jupiter", GM_JUPITER);
    let earth_moon = MassiveBody::new("Earth-Moon barycentre", GM_EARTH + GM_MOON);

    let earth_moon_orbit = KeplerOrbit::new(
        &sun,
        Some(&earth_moon),
        epoch,
        elements(1.000_002_61 * AU_M, 0.016_711_23, 0.0, 0.0, 102.937_68, -2.473_11),
    )?;
    let moon_orbit = KeplerOrbit::new(
        &earth,
        Some(&moon),
        epoch,
        elements(384_399e3, 0.0549, 5.145, 125.08, 318.15, 135.27),
    )?;
    let mars_orbit = KeplerOrbit::new(
        &sun,
        Some(&mars),
        epoch,
        elements(1.523_710_34 * AU_M, 0.093_394_10, 1.849_69, 49.559_53, -73.503_17, 19.390_20),
    )?;
    let jupiter_orbit = KeplerOrbit::new(
        &sun,
        Some(&jupiter),
        epoch,
        elements(5.202_887 * AU_M, 0.048_386_24, 1.304_40, 100.473_91, -85.745_43, 19.667_96),
    )?;

    let at_rest = DegreesOfFreedom::new(Vector3::zeros(), Vector3::zeros());
    let earth_moon_dof = at_rest + earth_moon_orbit.primocentric_state_vectors(epoch);
    let moon_from_earth = moon_orbit.primocentric_state_vectors(epoch);
    let moon_fraction = GM_MOON / (GM_EARTH + GM_MOON);
    let earth_dof = DegreesOfFreedom::new(
        earth_moon_dof.position() - moon_from_earth.position() * moon_fraction,
        earth_moon_dof.velocity() - moon_from_earth.velocity() * moon_fraction,
    );
    let moon_dof = earth_dof + moon_from_earth;

    let bodies = vec![sun, earth, moon, mars, jupiter];
    let heliocentric = vec![
        at_rest,
        earth_dof,
        moon_dof,
        at_rest + mars_orbit.primocentric_state_vectors(epoch),
        at_rest + jupiter_orbit.primocentric_state_vectors(epoch),
    ];

    let mut barycentre = BarycentreCalculator::new();
    for (body, dof) in bodies.iter().zip(&heliocentric) {
        barycentre.add(dof, body.gravitational_parameter());
    }
    let barycentre = barycentre.get();
    let barycentric: Vec<_> = heliocentric
        .iter()
        .map(|dof| *dof - barycentre)
        .collect();

    Ok(BodyCatalog::from_bodies(epoch, &bodies, &barycentric))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn state_of(catalog: &BodyCatalog, name: &str) -> DegreesOfFreedom {
        catalog
            .bodies
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.degrees_of_freedom())
            .unwrap()
    }

    #[test]
    fn test_catalog_is_valid() {
        let catalog = solar_system().unwrap();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.epoch(), Instant::J2000);
        catalog.validate().unwrap();
    }

    #[test]
    fn test_barycentre_at_rest_at_origin() {
        let catalog = solar_system().unwrap();
        let mut barycentre = BarycentreCalculator::new();
        for entry in &catalog.bodies {
            barycentre.add(&entry.degrees_of_freedom(), entry.gravitational_parameter);
        }
        let barycentre = barycentre.get();
        assert!(barycentre.position().norm() < 1.0);
        assert!(barycentre.velocity().norm() < 1e-9);
    }

    #[test]
    fn test_plausible_distances() {
        let catalog = solar_system().unwrap();
        let sun = state_of(&catalog, "Sun");
        let earth = state_of(&catalog, "Earth");
        let moon = state_of(&catalog, "Moon");
        let jupiter = state_of(&catalog, "Jupiter");

        // Early January, close to perihelion
        let earth_sun = earth.position_distance(&sun) / AU_M;
        assert!((0.982..0.985).contains(&earth_sun), "{earth_sun}");
        assert_relative_eq!(earth.velocity_distance(&sun), 30_280.0, max_relative = 0.01);

        let earth_moon = moon.position_distance(&earth);
        assert!((356_000e3..407_000e3).contains(&earth_moon), "{earth_moon}");

        let jupiter_sun = jupiter.position_distance(&sun) / AU_M;
        assert!((4.95..5.46).contains(&jupiter_sun), "{jupiter_sun}");
    }
}
