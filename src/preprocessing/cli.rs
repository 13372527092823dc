use std::{
    error::Error,
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    sync::LazyLock,
};

use clap::Parser;
use tracing::info;

use crate::{
    preprocessing::{
        ImageStreamSettings, InterfaceMode, SimulationInput,
        image_input::{mask_from_image, solid_cells_from_mask},
    },
    sim::{
        boundary::{BoundaryPolicy, VelocityBoundary},
        config::SimConfig,
        source::{ActionKind, Emitter},
    },
};

static DEFAULT_FRAMES_PATH: LazyLock<&Path> = LazyLock::new(|| Path::new("sim-frames"));

// Raw, CLI input
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    #[arg(help = "The path to a PNG image marking obstacle cells (dark pixels).")]
    mask_path: Option<PathBuf>,

    #[arg(long, help = "An input file with pre-loaded parameters.")]
    input_json: Option<PathBuf>,

    #[arg(long, help = "Optional path to save the resolved input file to.")]
    input_json_savepath: Option<PathBuf>,

    #[arg(
        long,
        help = "The mode to run the simulation in: `video` or `headless`",
        default_value = "video"
    )]
    mode: String,

    #[arg(
        long,
        help = "An optional directory pointing to where frames should be saved."
    )]
    frames_dir: Option<PathBuf>,

    #[arg(long, default_value = "64", help = "Interior cells along x.")]
    columns: usize,

    #[arg(long, default_value = "64", help = "Interior cells along y.")]
    rows: usize,

    #[arg(long, help = "Domain length in x axis.", default_value = "1.0")]
    length_x: f32,

    #[arg(long, help = "Domain length in y axis.", default_value = "1.0")]
    length_y: f32,

    #[arg(long, default_value = "0.1", help = "Time step in seconds.")]
    dt: f32,

    #[arg(short, long, default_value = "10", help = "Simulation time in seconds.")]
    simtime: f32,

    #[arg(long, default_value = "0.0001", help = "Velocity viscosity.")]
    viscosity: f32,

    #[arg(long, default_value = "0.0001", help = "Density diffusion constant.")]
    diffusion: f32,

    #[arg(long, default_value = "20", help = "Gauss-Seidel sweeps per solve.")]
    iterations: usize,

    #[arg(
        long,
        default_value = "y-wrap-x-sink",
        help = "Density boundary: mirror, oppose-x, oppose-y, y-wrap, y-wrap-x-sink, wind-tunnel"
    )]
    density_boundary: String,

    #[arg(
        long,
        default_value = "wrap-y",
        help = "Velocity boundary: walls, wrap-y, wind-tunnel"
    )]
    velocity_boundary: String,

    #[arg(long, allow_negative_numbers = true, help = "Uniform y acceleration applied every step.")]
    gravity: Option<f32>,

    #[arg(long, help = "Source action: density, velocity or obstacle.")]
    action: Option<String>,

    #[arg(long, default_value = "0.5", help = "Source x position.")]
    source_x: f32,

    #[arg(long, default_value = "0.5", help = "Source y position.")]
    source_y: f32,

    #[arg(long, allow_negative_numbers = true, default_value = "0.0", help = "Velocity source x drag.")]
    drag_x: f32,

    #[arg(long, allow_negative_numbers = true, default_value = "0.0", help = "Velocity source y drag.")]
    drag_y: f32,

    #[arg(long, help = "Seconds the source stays active; forever if omitted.")]
    source_duration: Option<f32>,
}

impl CliArgs {
    /// Resolve the arguments (or the input file they point to) into a
    /// complete simulation input. Boundary and action selectors are checked
    /// here; numeric ranges are checked when the solver is built.
    pub fn crate_input(&self) -> Result<SimulationInput, Box<dyn Error>> {
        let mut input = match &self.input_json {
            Some(input_filepath) => Self::load_input(input_filepath)?,
            None => self.input_from_args()?,
        };

        if let Some(mask_path) = &self.mask_path {
            let mask = mask_from_image(mask_path)?;
            let cells = solid_cells_from_mask(&mask, input.config.resolution);
            info!(
                "Loaded {} solid cells from {}",
                cells.len(),
                mask_path.display()
            );
            input.solid_cells.extend(cells);
        }

        if let Some(savepath) = &self.input_json_savepath {
            let writer = BufWriter::new(File::create(savepath)?);
            serde_json::to_writer_pretty(writer, &input)?;
            info!("Saved input file to {}", savepath.display());
        }

        Ok(input)
    }

    fn load_input(input_filepath: &Path) -> Result<SimulationInput, Box<dyn Error>> {
        if !input_filepath.exists() {
            return Err(format!("Input file {:?} does not exist.", input_filepath).into());
        }
        if input_filepath.is_dir() {
            return Err(format!("Input file {:?} is a directory.", input_filepath).into());
        }

        info!("Using input file {}", input_filepath.display());

        let reader = BufReader::new(File::open(input_filepath)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn input_from_args(&self) -> Result<SimulationInput, Box<dyn Error>> {
        let mode = match self.mode.as_str() {
            "video" => {
                let frames_dir = self
                    .frames_dir
                    .clone()
                    .unwrap_or((*DEFAULT_FRAMES_PATH).into());

                InterfaceMode::ImageStream(ImageStreamSettings { frames_dir })
            }
            "headless" => InterfaceMode::Headless,
            other => {
                return Err(format!(
                    "'{}' is not a valid interface mode. Use --help for info.",
                    other
                )
                .into());
            }
        };

        let config = SimConfig {
            dt: self.dt,
            viscosity: self.viscosity,
            diffusion: self.diffusion,
            solver_iterations: self.iterations,
            resolution: (self.columns, self.rows),
            length: (self.length_x, self.length_y),
            density_boundary: self.density_boundary.parse::<BoundaryPolicy>()?,
            velocity_boundary: self.velocity_boundary.parse::<VelocityBoundary>()?,
        };

        let mut sources = Vec::new();
        if let Some(action) = &self.action {
            let action = action.parse::<ActionKind>()?;
            sources.push(Emitter {
                position: (self.source_x, self.source_y),
                action: action.with_drag((self.drag_x, self.drag_y)),
                start: 0.,
                stop: self.source_duration,
            });
        }

        Ok(SimulationInput {
            mode,
            simulation_time: self.simtime,
            config,
            gravity: self.gravity,
            sources,
            solid_cells: Vec::new(),
        })
    }
}
