/// Task runner for the solver thread

use std::{
    sync::mpsc,
    thread::{self, JoinHandle},
};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use crate::{
    ScalarField,
    observers::imgstream::{self, DisplayPacket},
    preprocessing::{ImageStreamSettings, InterfaceMode, SimulationInput},
    sim::{navier::Navier, numeric},
};

pub struct SimulationOutput {
    pub temporal_map: Vec<f32>, // maps idx->timestamp

    /// Interior density sum after the last step
    pub mass: f32,

    /// Largest speed |u| after the last step
    pub max_speed: f32,
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(10_000);
    let style = ProgressStyle::with_template(
        "[Elapsed: {elapsed_precise}] [{bar:40.cyan/blue}] {percent}% (Remaining: {eta_precise})",
    )
    .map(|style| style.progress_chars("##-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Drive `sim` to completion, handing every frame's density to `on_frame`.
/// Stops early if `on_frame` returns false.
fn run(
    mut sim: Navier,
    simulation_time: f32,
    mut on_frame: impl FnMut(usize, ScalarField) -> bool,
) -> SimulationOutput {
    let bar = progress_bar();

    let mut temporal_map: Vec<f32> = Vec::new();
    for (i, (_, density, t)) in sim.by_ref().enumerate() {
        let progress = ((t / simulation_time).min(1.) * 10_000.0).round() as u64;
        bar.set_position(progress);
        temporal_map.push(t);

        if !on_frame(i, density) {
            break;
        }
    }
    bar.finish();

    SimulationOutput {
        temporal_map,
        mass: numeric::interior_sum(sim.density()),
        max_speed: numeric::max_speed(sim.velocity()),
    }
}

/// The solver thread task to run in ImageStream mode
pub fn imgstream_task(
    settings: &ImageStreamSettings,
    sim: Navier,
    simulation_input: &SimulationInput,
) -> SimulationOutput {
    let (sender, receiver) = mpsc::channel();

    // spawn image io thread
    let frames_dir = settings.frames_dir.clone();
    let solid_cells = sim.grid().solid_cells().clone();
    let writer = thread::spawn(move || {
        imgstream::image_io_loop(receiver, solid_cells, &frames_dir).map_err(|err| err.to_string())
    });

    let output = run(sim, simulation_input.simulation_time, |i, density| {
        sender
            .send(DisplayPacket { density, i })
            .inspect_err(|_| warn!("Frame writer hung up; stopping at frame {i}"))
            .is_ok()
    });

    // closing the channel ends the writer loop
    drop(sender);
    match writer.join() {
        Ok(Err(err)) => error!("Failed to write frames: {}", err),
        Err(_) => error!("Frame writer thread panicked"),
        Ok(Ok(())) => {}
    }

    output
}

/// The solver thread task to run in Headless mode
pub fn headless_task(sim: Navier, simulation_input: &SimulationInput) -> SimulationOutput {
    run(sim, simulation_input.simulation_time, |_, _| true)
}

/// Spawns the simulation thread and starts the corresponding task
pub fn spawn_sim_thread(
    simulation_input: SimulationInput,
    sim: Navier,
) -> JoinHandle<SimulationOutput> {
    thread::spawn(move || match &simulation_input.mode {
        InterfaceMode::ImageStream(settings) => imgstream_task(settings, sim, &simulation_input),
        InterfaceMode::Headless => headless_task(sim, &simulation_input),
    })
}
