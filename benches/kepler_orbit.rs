use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use orrery::constants::{AU_M, DAY_S, GM_EARTH, GM_SUN, TAU};
use orrery::physics::{KeplerOrbit, KeplerianElements, MassiveBody};
use orrery::time::Instant;

/// Orbit of an Earth-mass body around the Sun with the given eccentricity
fn make_orbit(rng: &mut StdRng, eccentricity: f64) -> KeplerOrbit {
    let semimajor_axis = if eccentricity < 1.0 { AU_M } else { -AU_M };
    KeplerOrbit::new(
        &MassiveBody::new("Sun", GM_SUN),
        Some(&MassiveBody::new("Earth", GM_EARTH)),
        Instant::J2000,
        KeplerianElements {
            semimajor_axis,
            eccentricity,
            inclination: rng.gen::<f64>() * 0.5,
            longitude_of_ascending_node: rng.gen::<f64>() * TAU,
            argument_of_periapsis: rng.gen::<f64>() * TAU,
            mean_anomaly: rng.gen::<f64>() * TAU,
        },
    )
    .unwrap()
}

fn bench_state_vectors(c: &mut Criterion, name: &str, seed: u64, eccentricities: (f64, f64)) {
    let mut rng = StdRng::seed_from_u64(seed);
    let samples = 1_000usize;

    c.bench_function(name, |b| {
        b.iter_batched(
            || {
                // Pre-generate orbits to keep the RNG out of the timed section
                (0..samples)
                    .map(|_| {
                        let e = rng.gen_range(eccentricities.0..eccentricities.1);
                        let t = Instant::J2000 + rng.gen_range(-365.0..365.0) * DAY_S;
                        (make_orbit(&mut rng, e), t)
                    })
                    .collect::<Vec<_>>()
            },
            |cases| {
                for (orbit, t) in cases {
                    black_box(orbit.barycentric_state_vectors(black_box(t)));
                }
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_elliptic(c: &mut Criterion) {
    bench_state_vectors(c, "kepler_orbit/elliptic_e<0.7", 0xDEADBEEF, (0.0, 0.7));
}

fn bench_high_eccentricity(c: &mut Criterion) {
    bench_state_vectors(c, "kepler_orbit/elliptic_0.7..0.99", 0xBADF00D, (0.7, 0.99));
}

fn bench_hyperbolic(c: &mut Criterion) {
    bench_state_vectors(c, "kepler_orbit/hyperbolic_1.1..3", 0xC0FFEE, (1.1, 3.0));
}

criterion_group!(benches, bench_elliptic, bench_high_eccentricity, bench_hyperbolic);
criterion_main!(benches);
