use std::process::exit;

use clap::Parser;
use stable_fluids::{
    preprocessing::cli::CliArgs,
    sim::{navier::Navier, task},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = CliArgs::parse();

    let simulation_input = match args.crate_input() {
        Ok(input) => input,
        Err(err) => {
            error!("{}", err);
            exit(1);
        }
    };
    simulation_input.log();

    let mut sim = match Navier::new(simulation_input.config.clone()) {
        Ok(sim) => sim.with_schedule(
            simulation_input.simulation_time,
            simulation_input.sources.clone(),
        ),
        Err(err) => {
            error!("Invalid configuration: {}", err);
            exit(1);
        }
    };
    sim.set_gravity(simulation_input.gravity);
    sim.mark_solid_cells(simulation_input.solid_cells.iter().copied());

    let handle = task::spawn_sim_thread(simulation_input, sim);

    let output = match handle.join() {
        Ok(output) => output,
        Err(_) => {
            error!("Solver thread panicked");
            exit(1);
        }
    };

    info!(
        "Finished {} steps (t = {} s); final mass {:.6}, max speed {:.6}",
        output.temporal_map.len(),
        output.temporal_map.last().copied().unwrap_or(0.),
        output.mass,
        output.max_speed,
    );
}
