// Solver parameters and their validation

use std::{error::Error, fmt};

use serde::{Deserialize, Serialize};

use crate::sim::boundary::{BoundaryPolicy, VelocityBoundary};

/// Raised when a configuration cannot produce a valid simulation. Every
/// variant is detected before the first step runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    UnknownBoundary(String),
    UnknownAction(String),
    InvalidResolution { columns: usize, rows: usize },
    InvalidLength { x: f32, y: f32 },
    InvalidParameter { name: &'static str, value: f32 },
    ZeroIterations,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownBoundary(name) => write!(f, "unknown boundary policy '{name}'"),
            ConfigError::UnknownAction(name) => write!(f, "unknown source action '{name}'"),
            ConfigError::InvalidResolution { columns, rows } => {
                write!(f, "grid resolution must be positive, got {columns}x{rows}")
            }
            ConfigError::InvalidLength { x, y } => {
                write!(f, "domain length must be positive and finite, got <{x}, {y}>")
            }
            ConfigError::InvalidParameter { name, value } => {
                write!(f, "{name} must be non-negative and finite, got {value}")
            }
            ConfigError::ZeroIterations => write!(f, "solver iteration count must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

/// Everything the solver needs to advance one step. Owned by the
/// orchestrator; nothing is read from shared state.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Time step (s)
    pub dt: f32,

    /// Kinematic viscosity applied to velocity diffusion
    pub viscosity: f32,

    /// Diffusion constant of the density field
    pub diffusion: f32,

    /// Gauss-Seidel sweeps per diffusion and projection solve
    pub solver_iterations: usize,

    /// Interior cell count (columns, rows)
    pub resolution: (usize, usize),

    /// Physical domain size (x, y)
    pub length: (f32, f32),

    /// Halo rule for the density field
    pub density_boundary: BoundaryPolicy,

    /// Halo rule for the velocity field
    pub velocity_boundary: VelocityBoundary,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            dt: 0.1,
            viscosity: 0.0001,
            diffusion: 0.0001,
            solver_iterations: 20,
            resolution: (64, 64),
            length: (1., 1.),
            density_boundary: BoundaryPolicy::YWrapXSink,
            velocity_boundary: VelocityBoundary::WrapY,
        }
    }
}

impl SimConfig {
    /// Check the preconditions the numeric kernels rely on: positive grid
    /// dimensions, positive domain length, non-negative constants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (columns, rows) = self.resolution;
        if columns == 0 || rows == 0 {
            return Err(ConfigError::InvalidResolution { columns, rows });
        }

        let (x, y) = self.length;
        if !(x.is_finite() && y.is_finite() && x > 0. && y > 0.) {
            return Err(ConfigError::InvalidLength { x, y });
        }

        for (name, value) in [
            ("dt", self.dt),
            ("viscosity", self.viscosity),
            ("diffusion", self.diffusion),
        ] {
            if !value.is_finite() || value < 0. {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }

        if self.solver_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }

        if let BoundaryPolicy::WindTunnel { inflow } = self.density_boundary {
            if !inflow.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name: "density inflow",
                    value: inflow,
                });
            }
        }

        if let VelocityBoundary::WindTunnel { inflow } = self.velocity_boundary {
            if !inflow.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name: "velocity inflow",
                    value: inflow,
                });
            }
        }

        Ok(())
    }

    /// Physical size of one cell (dx, dy)
    pub fn spacing(&self) -> (f32, f32) {
        (
            self.length.0 / self.resolution.0 as f32,
            self.length.1 / self.resolution.1 as f32,
        )
    }
}
