// Pressure projection: removes the divergent part of a velocity field

use crate::{
    VectorField,
    sim::{
        boundary::{BoundaryPolicy, VelocityBoundary},
        grid::Scratch,
        numeric,
    },
};

/// Project `velocity` onto (approximately) divergence-free fields.
///
/// Solves the Poisson equation ∇²p = ∇⋅u for pressure with a fixed number of
/// Gauss-Seidel sweeps and subtracts ∇p from the velocity. Mathematically
/// the right-hand side is scaled by the cell area so the sweep reduces to
/// `p = (rhs + W + E + S + N) / 4`.
///
/// Parameters
/// - `velocity` - The velocity field, corrected in place
/// - `scratch` - Pressure and divergence buffers, same shape as `velocity`
/// - `pressure_bc` - The halo rule for pressure and divergence
/// - `velocity_bc` - The halo rule for the corrected velocity
/// - `iterations` - The fixed number of pressure sweeps
/// - `spacing` - The physical cell size (dx, dy)
pub fn project(
    velocity: &mut VectorField,
    scratch: &mut Scratch,
    pressure_bc: BoundaryPolicy,
    velocity_bc: VelocityBoundary,
    iterations: usize,
    spacing: (f32, f32),
) {
    let (dx, dy) = spacing;
    let (rows, cols) = velocity[0].shape();

    // poisson rhs
    numeric::divergence_into(velocity, dx, dy, -dx * dy, &mut scratch.divergence);
    scratch.pressure.fill(0.);

    pressure_bc.apply(&mut scratch.divergence);
    pressure_bc.apply(&mut scratch.pressure);

    numeric::relax(
        &mut scratch.pressure,
        &scratch.divergence,
        1.,
        4.,
        iterations,
        |field| pressure_bc.apply(field),
    );

    // subtract the pressure gradient
    let p = &scratch.pressure;
    for c in 1..(cols - 1) {
        for r in 1..(rows - 1) {
            velocity[0][(r, c)] -= (p[(r, c + 1)] - p[(r, c - 1)]) / (2. * dx);
            velocity[1][(r, c)] -= (p[(r + 1, c)] - p[(r - 1, c)]) / (2. * dy);
        }
    }

    velocity_bc.apply(velocity);
}
