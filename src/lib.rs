pub mod cli;
pub mod report;

use crate::cli::Cli;
use flow::advection::Axis;
use flow::constants::DEFAULT_CONFIG_PATH;
use flow::seeding::{generate_seed8, random_seeds};
use flow::{Advection, AdvectionControl, FlowConfig};
use log::{info, warn};
use std::path::Path;
use std::time::Instant;

/// Load the configuration named on the command line, falling back to
/// `flow_config.toml` in the working directory and then to defaults
pub fn load_config(cli: &Cli) -> Result<FlowConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => FlowConfig::load_from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => FlowConfig::load_from_file(DEFAULT_CONFIG_PATH)?,
        None => FlowConfig::default(),
    };
    cli.apply_overrides(&mut config);
    Ok(config)
}

pub fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(cli)?;
    let field = cli.field.build();

    let (min, max) = config
        .seeding
        .rake()
        .unwrap_or_else(|| field.extents(config.seeding.start_time));
    let code = config.seeding.rng_seed.unwrap_or_else(generate_seed8);
    let seeds: Vec<_> = random_seeds(config.seeding.count, min, max, config.seeding.start_time, code)
        .into_iter()
        .filter(|seed| field.inside_volume(seed.time, seed.location))
        .collect();
    if seeds.len() < config.seeding.count {
        warn!(
            "{} of {} seeds fell outside the field and were dropped",
            config.seeding.count - seeds.len(),
            config.seeding.count
        );
    }

    info!(
        "Advection w/ field: {:?}, seeds: {}, steps: {}, length: {}, method: {:?}, rng seed: {}",
        cli.field,
        seeds.len(),
        config.run.max_steps,
        config.advection.base_step_size,
        config.advection.method,
        code
    );

    let mut advection = Advection::from_config(&config.advection)?;
    for (axis, bounds) in [Axis::X, Axis::Y, Axis::Z].into_iter().zip(config.periodic.bounds()) {
        if let Some([lo, hi]) = bounds {
            advection.set_periodicity(axis, true, lo, hi)?;
        }
    }
    advection.use_velocity_field(field.as_ref());
    advection.use_seed_particles(seeds);

    let interval = config.run.progress_interval.max(1);
    let started = Instant::now();
    let steps = advection.advect_steps_with(config.advection.method, config.run.max_steps, |progress| {
        if progress.step % interval == 0 {
            info!(
                "Step {}: {} active streams, {} particles",
                progress.step, progress.active_streams, progress.total_particles
            );
        }
        AdvectionControl::Continue
    })?;
    info!("Advected {} steps in {:.3?}", steps, started.elapsed());

    for summary in report::summarize(&advection) {
        info!("{}", summary);
    }
    info!("Longest stream: {} particles", advection.max_num_of_particles());

    advection.output_streams_gnuplot(&config.run.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_run_writes_streams() {
        let output = std::env::temp_dir().join("flowtrace_run_test.dat");
        let cli = Cli::parse_from([
            "flowtrace",
            "--field",
            "uniform",
            "--seeds",
            "4",
            "--steps",
            "5",
            "--output",
            output.to_str().unwrap(),
        ]);

        run(&cli).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        let blocks = text.split("\n\n").count();
        assert_eq!(blocks, 4);
        std::fs::remove_file(&output).ok();
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["flowtrace", "--config", "/nonexistent/flow_config.toml"]);
        assert!(load_config(&cli).is_err());
    }
}
