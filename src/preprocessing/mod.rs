use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::sim::{config::SimConfig, source::Emitter};

pub mod cli;
pub mod image_input;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ImageStreamSettings {
    pub frames_dir: PathBuf,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum InterfaceMode {
    /// Write every frame to `frames_dir` as a PNG
    ImageStream(ImageStreamSettings),
    /// Solve without producing frames
    Headless,
}

/// Everything required to run one simulation, as read from the command line
/// or from an input file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SimulationInput {
    pub mode: InterfaceMode,
    pub simulation_time: f32,

    #[serde(default)]
    pub config: SimConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gravity: Option<f32>,

    #[serde(default)]
    pub sources: Vec<Emitter>,

    /// Obstacle cells (i, j), already resampled onto the grid
    #[serde(default)]
    pub solid_cells: Vec<(usize, usize)>,
}

impl SimulationInput {
    pub fn log(&self) {
        let config = &self.config;

        info!(
            "Simulation is shown below:\n\n\
        \t time range:   {} s\n\
        \t time step:    {} s\n\
        \t resolution:   {} x {} cells\n\
        \t length:       < {}, {} >\n\
        \t viscosity:    {}\n\
        \t diffusion:    {}\n\
        \t iterations:   {}\n\
        \t gravity:      {}\n\
        \t sources:      {}\n\
        \t solid cells:  {}\n\n\
        ",
            self.simulation_time,
            config.dt,
            config.resolution.0,
            config.resolution.1,
            config.length.0,
            config.length.1,
            config.viscosity,
            config.diffusion,
            config.solver_iterations,
            self.gravity.map_or("none".to_string(), |g| g.to_string()),
            self.sources.len(),
            self.solid_cells.len(),
        );

        match serde_json::to_string_pretty(&(&self.mode, &config.density_boundary, &config.velocity_boundary)) {
            Ok(s) => info!("Mode and boundaries are:\n\n{}", s),
            Err(err) => warn!("Unable to display mode parameters: {:?}", err),
        }
    }
}
