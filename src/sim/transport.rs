// Implicit diffusion and semi-Lagrangian advection of a single field

use crate::{
    ScalarField, VectorField,
    sim::{boundary::BoundaryPolicy, numeric},
};

/// Diffuse `previous` into `current` by solving the implicit diffusion
/// equation with `iterations` Gauss-Seidel sweeps. `current` is the initial
/// guess and is overwritten in place.
///
/// Unconditionally stable for any `k >= 0` and `dt >= 0`.
///
/// Parameters
/// - `current` - The field to write; also the starting guess
/// - `previous` - The field before diffusion
/// - `k` - The diffusion constant (viscosity for velocity)
/// - `bc` - The halo rule, reapplied after every sweep
/// - `iterations` - The fixed number of sweeps
/// - `dt` - The time step
/// - `area` - The physical area of the domain
pub fn diffuse(
    current: &mut ScalarField,
    previous: &ScalarField,
    k: f32,
    bc: BoundaryPolicy,
    iterations: usize,
    dt: f32,
    area: f32,
) {
    let a = dt * k * area.sqrt();

    numeric::relax(current, previous, a, 1. + 4. * a, iterations, |field| {
        bc.apply(field)
    });
}

/// Transport `previous` along `velocity` for one time step and store the
/// result in `current`. Each interior cell is traced back by `dt * u`,
/// clamped to the simulated domain and bilinearly sampled.
///
/// Parameters
/// - `current` - The field to write
/// - `previous` - The field being transported
/// - `velocity` - The full (x, y) velocity the field moves with
/// - `bc` - The halo rule applied once after the sweep
/// - `dt` - The time step
/// - `spacing` - The physical cell size (dx, dy)
pub fn advect(
    current: &mut ScalarField,
    previous: &ScalarField,
    velocity: &VectorField,
    bc: BoundaryPolicy,
    dt: f32,
    spacing: (f32, f32),
) {
    let (rows, cols) = current.shape();
    let (nx, ny) = ((cols - 2) as f32, (rows - 2) as f32);
    let (dx, dy) = spacing;

    for c in 1..(cols - 1) {
        for r in 1..(rows - 1) {
            // backtrack in cell units
            let x = (c as f32 - dt * velocity[0][(r, c)] / dx).clamp(0., nx);
            let y = (r as f32 - dt * velocity[1][(r, c)] / dy).clamp(0., ny);

            current[(r, c)] = numeric::sample_bilinear(previous, x, y);
        }
    }

    bc.apply(current);
}
