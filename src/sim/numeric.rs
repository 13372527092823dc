// Numeric kernels shared by the diffusion, advection and projection solvers

use na::DMatrix;

use crate::{ScalarField, VectorField};

/// Added before flooring a backtracked coordinate so positions that land a
/// rounding error short of a grid line resolve to that line
pub const SNAP_EPSILON: f32 = 1e-6;

/// Accumulate a source term: `field += dt * source`
pub fn add_source(field: &mut ScalarField, source: &ScalarField, dt: f32) {
    *field += source * dt;
}

/// Run a fixed number of in-place Gauss-Seidel sweeps over the interior of
/// `x`, solving
///
/// ```text
/// x[r, c] = (b[r, c] + a * (x[r, c-1] + x[r, c+1] + x[r-1, c] + x[r+1, c])) / denom
/// ```
///
/// Cells updated earlier in a sweep are read back immediately. `boundary`
/// rewrites the halo after every sweep.
///
/// Parameters
/// - `x` - The unknown field, also the initial guess
/// - `b` - The right-hand side; must have the same shape as `x`
/// - `a` - The neighbor coupling
/// - `denom` - The diagonal coefficient
/// - `iterations` - The number of full sweeps
/// - `boundary` - Called on `x` after each sweep
pub fn relax(
    x: &mut ScalarField,
    b: &ScalarField,
    a: f32,
    denom: f32,
    iterations: usize,
    boundary: impl Fn(&mut ScalarField),
) {
    debug_assert_eq!(x.shape(), b.shape());

    let (rows, cols) = x.shape();

    for _ in 0..iterations {
        for c in 1..(cols - 1) {
            for r in 1..(rows - 1) {
                let neighbors = x[(r, c - 1)] + x[(r, c + 1)] + x[(r - 1, c)] + x[(r + 1, c)];
                x[(r, c)] = (b[(r, c)] + a * neighbors) / denom;
            }
        }
        boundary(x);
    }
}

/// Compute the divergence ∂u/∂x + ∂v/∂y of a velocity field on the interior
/// cells using central differences. Halo cells of the result are zero.
///
/// Parameters:
/// - `field` - The `VectorField` to take the divergence of
/// - `dx` - The x-axis cell size
/// - `dy` - The y-axis cell size
///
/// Returns:
///     A `ScalarField` of the divergence.
pub fn divergence(field: &VectorField, dx: f32, dy: f32) -> ScalarField {
    let (rows, cols) = field[0].shape();
    let mut div: DMatrix<f32> = DMatrix::zeros(rows, cols);

    divergence_into(field, dx, dy, 1., &mut div);

    div
}

/// Write `scale * ∇⋅field` into the interior of `out`, leaving its halo as is.
pub fn divergence_into(field: &VectorField, dx: f32, dy: f32, scale: f32, out: &mut ScalarField) {
    let (rows, cols) = field[0].shape();
    let (u, v) = (&field[0], &field[1]);

    for c in 1..(cols - 1) {
        for r in 1..(rows - 1) {
            let du_dx = (u[(r, c + 1)] - u[(r, c - 1)]) / (2. * dx);
            let dv_dy = (v[(r + 1, c)] - v[(r - 1, c)]) / (2. * dy);
            out[(r, c)] = scale * (du_dx + dv_dy);
        }
    }
}

/// Bilinearly sample a padded field at a fractional (column, row) position.
///
/// The position must lie within `[0, cols - 1] x [0, rows - 1]`; the caller
/// clamps it. Weights are clamped to `[0, 1]` so rounding near a grid line
/// never extrapolates.
pub fn sample_bilinear(field: &ScalarField, x: f32, y: f32) -> f32 {
    let (rows, cols) = field.shape();

    let c0 = ((x + SNAP_EPSILON).floor().max(0.) as usize).min(cols - 2);
    let r0 = ((y + SNAP_EPSILON).floor().max(0.) as usize).min(rows - 2);
    let (c1, r1) = (c0 + 1, r0 + 1);

    let s1 = (x - c0 as f32).clamp(0., 1.);
    let s0 = 1. - s1;
    let t1 = (y - r0 as f32).clamp(0., 1.);
    let t0 = 1. - t1;

    s0 * (t0 * field[(r0, c0)] + t1 * field[(r1, c0)])
        + s1 * (t0 * field[(r0, c1)] + t1 * field[(r1, c1)])
}

/// Sum of the interior cells of a padded field
pub fn interior_sum(field: &ScalarField) -> f32 {
    let (rows, cols) = field.shape();
    field.view((1, 1), (rows - 2, cols - 2)).sum()
}

/// Largest speed |u| over every cell, halo included
pub fn max_speed(field: &VectorField) -> f32 {
    field[0]
        .iter()
        .zip(field[1].iter())
        .fold(0.0f32, |m, (u, v)| m.max((u * u + v * v).sqrt()))
}
