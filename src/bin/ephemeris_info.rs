//! Ephemeris Information Tool
//!
//! This binary builds an ephemeris from a simulation configuration (or the
//! built-in solar system), integrates it over a number of days and prints
//! statistics about the fitted trajectories along with sampled positions.
//!
//! Usage:
//!   cargo run --bin ephemeris_info -- [--days 365] [--samples 10] [path/to/config.json]

use std::path::PathBuf;
use std::time::Instant as WallClock;

use clap::Parser;
use orrery::catalog::{solar_system, EphemerisParameters, SimulationConfig};
use orrery::constants::{AU_M, DAY_S};
use orrery::integrators::FixedStepIntegratorKind;
use orrery::physics::Ephemeris;

/// Type alias for the error type used throughout this module
type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Ephemeris Information Tool
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Integrates an N-body ephemeris and displays its fitted trajectories",
    long_about = None
)]
struct Args {
    /// Number of days to integrate
    #[arg(short, long, default_value_t = 30.0)]
    days: f64,

    /// Number of sample instants to print
    #[arg(short = 'n', long, default_value_t = 5)]
    samples: usize,

    /// Integration step in seconds, overriding the configuration
    #[arg(long)]
    step: Option<f64>,

    /// Low fitting tolerance in metres, overriding the configuration
    #[arg(long)]
    low_tolerance: Option<f64>,

    /// High fitting tolerance in metres, overriding the configuration
    #[arg(long)]
    high_tolerance: Option<f64>,

    /// Planetary integrator (velocity_verlet or runge_kutta_4)
    #[arg(long)]
    integrator: Option<FixedStepIntegratorKind>,

    /// Simulation configuration (JSON); the built-in solar system if omitted
    config: Option<PathBuf>,
}

/// Prints a section header with a title and separator line
fn print_section_header(title: &str) {
    println!("\n{}:", title);
    println!("-------------------------------------------------------");
}

/// Helper to print named values in a formatted way
fn print_named_value(name: &str, value: impl std::fmt::Display) {
    println!("{}: {}", name, value);
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            println!("Loading simulation configuration: {}", path.display());
            SimulationConfig::from_file(path)?
        }
        None => {
            println!("Using the built-in solar system");
            SimulationConfig::new(solar_system()?, EphemerisParameters::default())
        }
    };

    let parameters = &mut config.ephemeris;
    if let Some(step) = args.step {
        parameters.step = step;
    }
    if let Some(low) = args.low_tolerance {
        parameters.low_fitting_tolerance = low;
    }
    if let Some(high) = args.high_tolerance {
        parameters.high_fitting_tolerance = high;
    }
    if let Some(integrator) = args.integrator {
        parameters.integrator = integrator;
    }
    parameters.validate()?;
    Ok(config)
}

fn display_configuration(config: &SimulationConfig) {
    print_section_header("Configuration");
    print_named_value("Epoch (JD TDB)", config.catalog.epoch_jd);
    print_named_value("Integrator", config.ephemeris.integrator);
    print_named_value("Step", format!("{} s", config.ephemeris.step));
    print_named_value(
        "Fitting tolerances",
        format!(
            "{} m (low), {} m (high)",
            config.ephemeris.low_fitting_tolerance, config.ephemeris.high_fitting_tolerance
        ),
    );
}

fn display_bodies(ephemeris: &Ephemeris) {
    print_section_header("Bodies");
    println!("{:<4} {:<24} {:>22}", "ID", "Name", "GM (m^3/s^2)");
    for (id, body) in ephemeris.bodies() {
        println!(
            "{:<4} {:<24} {:>22.10e}",
            id.index(),
            body.name(),
            body.gravitational_parameter()
        );
    }
}

fn display_trajectories(ephemeris: &Ephemeris) {
    print_section_header("Trajectories");
    println!(
        "{:<24} {:>8} {:>6} {:>12} {:>14}",
        "Name", "Pieces", "Tail", "Degree", "Max error (m)"
    );
    for (id, body) in ephemeris.bodies() {
        let trajectory = ephemeris.trajectory(id);
        let max_error = trajectory
            .pieces()
            .iter()
            .map(|piece| piece.error_estimate())
            .fold(0.0, f64::max);
        println!(
            "{:<24} {:>8} {:>6} {:>12} {:>14.3e}",
            body.name(),
            trajectory.pieces().len(),
            trajectory.tail_len(),
            trajectory.degree(),
            max_error
        );
    }
}

fn display_samples(ephemeris: &Ephemeris, samples: usize) {
    print_section_header("Barycentric positions (AU)");
    let t_min = ephemeris.t_min();
    let t_max = ephemeris.t_max();
    let span = t_max - t_min;
    for i in 0..samples {
        let fraction = if samples > 1 {
            i as f64 / (samples - 1) as f64
        } else {
            0.0
        };
        let t = (t_min + span * fraction).min(t_max);
        println!("t = {:+.4} d", (t - t_min) / DAY_S);
        for (id, body) in ephemeris.bodies() {
            let position = ephemeris.trajectory(id).evaluate_position(t) / AU_M;
            println!(
                "    {:<24} {:>14.9} {:>14.9} {:>14.9}",
                body.name(),
                position.x,
                position.y,
                position.z
            );
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if !(args.days.is_finite() && args.days > 0.0) {
        return Err(format!("the number of days must be positive, got {}", args.days).into());
    }

    let config = load_config(&args)?;
    display_configuration(&config);

    let start_time = WallClock::now();
    let mut ephemeris = config.build_ephemeris()?;
    display_bodies(&ephemeris);

    let t_final = ephemeris.t_min() + args.days * DAY_S;
    ephemeris.prolong(t_final);
    println!(
        "\nIntegrated {} days in {:.2?}",
        args.days,
        start_time.elapsed()
    );

    display_trajectories(&ephemeris);
    display_samples(&ephemeris, args.samples);

    let total_elapsed = start_time.elapsed();
    println!("\nTotal time: {:.2?}", total_elapsed);

    Ok(())
}
