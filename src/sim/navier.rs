// Stable-fluids timestepping struct

use tracing::{Level, debug, enabled, error};

use crate::{
    ScalarField, VectorField,
    sim::{
        boundary::{BoundaryPolicy, TRANSPORT_POLICIES},
        config::{ConfigError, SimConfig},
        grid::Grid,
        numeric, poisson,
        source::{Emitter, SourceAction, SourcePoint, UNIT_DENSITY},
        transport,
    },
};

/// Maximum allowable velocity before stopping simulation
const MAX_VELOCITY: f32 = 1000.;

/// High-level stable-fluids timestepping object. Owns the grid and all
/// simulation parameters and advances them one discrete step at a time.
pub struct Navier {
    /// The solver parameters
    config: SimConfig,

    /// All field buffers
    grid: Grid,

    /// Uniform y acceleration added to the velocity source every step
    gravity: Option<f32>,

    /// The total time domain to simulate over when iterating
    pub simtime: f32,

    /// Scheduled sources used when iterating
    emitters: Vec<Emitter>,

    /// The current time instant of the simulation
    pub t: f32,

    /// Iteration-counter
    i: usize,
}

impl Navier {
    /// Create a new simulation with every field at rest.
    ///
    /// Parameters
    /// - `config` - The solver parameters, validated here
    ///
    /// Returns
    /// - The simulation, or the first configuration problem found
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let (columns, rows) = config.resolution;
        let grid = Grid::new(columns, rows, config.length);

        Ok(Navier {
            config,
            grid,
            gravity: None,
            simtime: f32::INFINITY,
            emitters: Vec::new(),
            t: 0.,
            i: 0,
        })
    }

    /// Bound the run used by the `Iterator` implementation and attach the
    /// sources it replays.
    pub fn with_schedule(mut self, simtime: f32, emitters: Vec<Emitter>) -> Self {
        self.simtime = simtime;
        self.emitters = emitters;
        self
    }

    /// Set (or clear with `None`) the gravity applied every step
    pub fn set_gravity(&mut self, gravity: Option<f32>) {
        self.gravity = gravity;
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn velocity(&self) -> &VectorField {
        self.grid.velocity()
    }

    pub fn density(&self) -> &ScalarField {
        self.grid.density()
    }

    /// The number of completed steps
    pub fn iteration(&self) -> usize {
        self.i
    }

    /// Record obstacle cells (i, j). Obstacles are bookkeeping only; the
    /// solver does not yet constrain flow through them.
    pub fn mark_solid_cells(&mut self, cells: impl IntoIterator<Item = (usize, usize)>) {
        for (i, j) in cells {
            self.grid.mark_solid_cell(i, j);
        }
    }

    /// Advance the simulation by one time step.
    ///
    /// Parameters
    /// - `source` - The user input for this step, if any
    pub fn step(&mut self, source: Option<&SourcePoint>) {
        self.grid.clear_prev();
        self.grid.clear_sources();

        if let Some(g) = self.gravity {
            self.grid.velocity_source[1].fill(g);
        }

        if let Some(source) = source {
            self.inject(source);
        }

        self.velocity_step();
        self.density_step();

        self.i += 1;
        self.t += self.config.dt;

        if enabled!(Level::DEBUG) {
            let (dx, dy) = self.grid.spacing();
            let div = numeric::divergence(self.grid.velocity(), dx, dy);
            debug!(
                "step {}: t = {:.4}, max |u| = {:.4e}, max |div u| = {:.4e}, mass = {:.4e}",
                self.i,
                self.t,
                numeric::max_speed(self.grid.velocity()),
                div.amax(),
                numeric::interior_sum(self.grid.density()),
            );
        }
    }

    /// Translate a source point into the grid's source buffers
    fn inject(&mut self, source: &SourcePoint) {
        let (x, y) = (source.x, source.y);

        match source.action {
            SourceAction::Density => self.grid.add_density_source(x, y, UNIT_DENSITY),
            SourceAction::Velocity { drag: (vx, vy) } => {
                self.grid.add_velocity_source(x, y, vx, vy)
            }
            SourceAction::Obstacle => {
                let (i, j) = self.grid.mark_solid(x, y);
                debug!("Marked cell ({i}, {j}) as solid");
            }
        }
    }

    /// Add sources, diffuse, project, self-advect, project
    fn velocity_step(&mut self) {
        let config = &self.config;
        let grid = &mut self.grid;

        let (dt, iterations) = (config.dt, config.solver_iterations);
        let (spacing, area) = (grid.spacing(), grid.area());
        let velocity_bc = config.velocity_boundary;

        for axis in 0..2 {
            numeric::add_source(
                &mut grid.velocity.current[axis],
                &grid.velocity_source[axis],
                dt,
            );
        }

        grid.velocity.swap();

        for axis in 0..2 {
            transport::diffuse(
                &mut grid.velocity.current[axis],
                &grid.velocity.previous[axis],
                config.viscosity,
                TRANSPORT_POLICIES[axis],
                iterations,
                dt,
                area,
            );
        }

        poisson::project(
            &mut grid.velocity.current,
            &mut grid.scratch,
            BoundaryPolicy::Mirror,
            velocity_bc,
            iterations,
            spacing,
        );

        self.advect_velocity();

        let grid = &mut self.grid;
        poisson::project(
            &mut grid.velocity.current,
            &mut grid.scratch,
            BoundaryPolicy::Mirror,
            velocity_bc,
            iterations,
            spacing,
        );
    }

    /// Swap the velocity buffers and carry both components along the
    /// pre-advection velocity
    fn advect_velocity(&mut self) {
        let dt = self.config.dt;
        let grid = &mut self.grid;
        let spacing = grid.spacing();

        grid.velocity.swap();

        for axis in 0..2 {
            transport::advect(
                &mut grid.velocity.current[axis],
                &grid.velocity.previous[axis],
                &grid.velocity.previous,
                TRANSPORT_POLICIES[axis],
                dt,
                spacing,
            );
        }
    }

    /// Add sources, diffuse, advect along the current velocity
    fn density_step(&mut self) {
        let config = &self.config;
        let grid = &mut self.grid;

        let dt = config.dt;
        let (spacing, area) = (grid.spacing(), grid.area());
        let bc = config.density_boundary;

        numeric::add_source(&mut grid.density.current, &grid.density_source, dt);

        grid.density.swap();

        transport::diffuse(
            &mut grid.density.current,
            &grid.density.previous,
            config.diffusion,
            bc,
            config.solver_iterations,
            dt,
            area,
        );

        grid.density.swap();

        transport::advect(
            &mut grid.density.current,
            &grid.density.previous,
            &grid.velocity.current,
            bc,
            dt,
            spacing,
        );
    }

    /// Whether any velocity is non-finite or beyond `MAX_VELOCITY`
    fn exploded(&self) -> bool {
        self.grid
            .velocity()
            .iter()
            .any(|f| f.iter().any(|u| !u.is_finite() || u.abs() > MAX_VELOCITY))
    }
}

impl Iterator for Navier {
    type Item = (VectorField, ScalarField, f32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.t > self.simtime {
            return None;
        }

        let source = self
            .emitters
            .iter()
            .find(|e| e.is_active(self.t))
            .map(Emitter::source_point);

        self.step(source.as_ref());

        // check for simulation explosion
        if self.exploded() {
            error!(
                "Velocity exceeded maximum at t = {}; simulation exploded :(",
                self.t
            );
            return None;
        }

        Some((
            self.grid.velocity().clone(),
            self.grid.density().clone(),
            self.t,
        ))
    }
}
