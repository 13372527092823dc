// Padded field storage for the solver

use std::{collections::BTreeSet, mem};

use na::DMatrix;

use crate::{ScalarField, VectorField};

/// A double buffer. `swap` exchanges the two owned buffers without copying
/// any cell data.
#[derive(Clone, Debug)]
pub struct FieldPair<T> {
    /// The authoritative buffer once a step completes
    pub current: T,

    /// The read-source of the solver stage in progress
    pub previous: T,
}

impl<T> FieldPair<T> {
    pub fn swap(&mut self) {
        mem::swap(&mut self.current, &mut self.previous);
    }
}

/// Work buffers reused by every projection
#[derive(Clone, Debug)]
pub struct Scratch {
    pub pressure: ScalarField,
    pub divergence: ScalarField,
}

impl Scratch {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Scratch {
            pressure: DMatrix::zeros(rows, cols),
            divergence: DMatrix::zeros(rows, cols),
        }
    }
}

/// Owns every field buffer of the simulation.
///
/// Each field is `(rows + 2) x (columns + 2)`: interior cells live at
/// indices `1..=columns` (x) and `1..=rows` (y), surrounded by a one-cell
/// halo that only boundary policies write. Public cell coordinates are
/// `(i, j)` = (x index, y index); matrices are indexed `(j, i)`.
pub struct Grid {
    /// The number of interior columns (x)
    columns: usize,

    /// The number of interior rows (y)
    rows: usize,

    /// The physical size of the domain (x, y)
    length: (f32, f32),

    /// The velocity field and its previous state
    pub velocity: FieldPair<VectorField>,

    /// The density field and its previous state
    pub density: FieldPair<ScalarField>,

    /// Additive velocity forcing for the next step
    pub velocity_source: VectorField,

    /// Additive density forcing for the next step
    pub density_source: ScalarField,

    /// Projection buffers
    pub scratch: Scratch,

    /// Cells marked as obstacles, as (i, j)
    solid_cells: BTreeSet<(usize, usize)>,
}

impl Grid {
    /// Allocate a zeroed grid.
    ///
    /// Parameters
    /// - `columns` - The interior cell count along x; must be positive
    /// - `rows` - The interior cell count along y; must be positive
    /// - `length` - The physical size (x, y) of the domain
    pub fn new(columns: usize, rows: usize, length: (f32, f32)) -> Self {
        let zeros = || -> ScalarField { DMatrix::zeros(rows + 2, columns + 2) };

        Grid {
            columns,
            rows,
            length,
            velocity: FieldPair {
                current: [zeros(), zeros()],
                previous: [zeros(), zeros()],
            },
            density: FieldPair {
                current: zeros(),
                previous: zeros(),
            },
            velocity_source: [zeros(), zeros()],
            density_source: zeros(),
            scratch: Scratch::zeros(rows + 2, columns + 2),
            solid_cells: BTreeSet::new(),
        }
    }

    /// The interior cell count (columns, rows)
    pub fn interior(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// The physical size of one cell (dx, dy)
    pub fn spacing(&self) -> (f32, f32) {
        (
            self.length.0 / self.columns as f32,
            self.length.1 / self.rows as f32,
        )
    }

    /// The physical area of the domain
    pub fn area(&self) -> f32 {
        self.length.0 * self.length.1
    }

    /// The current velocity field
    pub fn velocity(&self) -> &VectorField {
        &self.velocity.current
    }

    /// The current density field
    pub fn density(&self) -> &ScalarField {
        &self.density.current
    }

    pub fn solid_cells(&self) -> &BTreeSet<(usize, usize)> {
        &self.solid_cells
    }

    /// Zero the previous-state buffers
    pub fn clear_prev(&mut self) {
        self.velocity.previous[0].fill(0.);
        self.velocity.previous[1].fill(0.);
        self.density.previous.fill(0.);
    }

    /// Zero the source buffers
    pub fn clear_sources(&mut self) {
        self.velocity_source[0].fill(0.);
        self.velocity_source[1].fill(0.);
        self.density_source.fill(0.);
    }

    /// The interior cell (i, j) containing the physical point (x, y).
    /// Points outside the domain are clamped to the nearest interior cell.
    pub fn container_cell(&self, x: f32, y: f32) -> (usize, usize) {
        let (dx, dy) = self.spacing();

        let to_cell = |p: f32, h: f32, n: usize| -> usize {
            let k = (p / h).floor();
            if k.is_nan() || k < 0. {
                1
            } else {
                (k as usize + 1).min(n)
            }
        };

        (to_cell(x, dx, self.columns), to_cell(y, dy, self.rows))
    }

    /// Accumulate `amount` into the density source of the cell containing (x, y)
    pub fn add_density_source(&mut self, x: f32, y: f32, amount: f32) {
        let (i, j) = self.container_cell(x, y);
        self.density_source[(j, i)] += amount;
    }

    /// Accumulate (vx, vy) into the velocity source of the cell containing (x, y)
    pub fn add_velocity_source(&mut self, x: f32, y: f32, vx: f32, vy: f32) {
        let (i, j) = self.container_cell(x, y);
        self.velocity_source[0][(j, i)] += vx;
        self.velocity_source[1][(j, i)] += vy;
    }

    /// Mark the cell containing (x, y) as solid and return it
    pub fn mark_solid(&mut self, x: f32, y: f32) -> (usize, usize) {
        let cell = self.container_cell(x, y);
        self.solid_cells.insert(cell);
        cell
    }

    /// Mark the interior cell (i, j) as solid; indices are clamped to the interior
    pub fn mark_solid_cell(&mut self, i: usize, j: usize) {
        let cell = (i.clamp(1, self.columns), j.clamp(1, self.rows));
        self.solid_cells.insert(cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation() {
        let grid = Grid::new(4, 3, (2., 1.5));

        assert_eq!(grid.interior(), (4, 3));
        assert_eq!(grid.spacing(), (0.5, 0.5));
        assert_eq!(grid.area(), 3.);

        for field in [
            &grid.velocity.current[0],
            &grid.velocity.current[1],
            &grid.velocity.previous[0],
            &grid.velocity.previous[1],
            &grid.density.current,
            &grid.density.previous,
            &grid.velocity_source[0],
            &grid.velocity_source[1],
            &grid.density_source,
            &grid.scratch.pressure,
            &grid.scratch.divergence,
        ] {
            assert_eq!(field.shape(), (5, 6));
            assert!(field.iter().all(|v| *v == 0.));
        }
    }

    #[test]
    fn test_swap_exchanges_buffers() {
        let mut grid = Grid::new(3, 3, (1., 1.));
        grid.density.current.fill(1.);

        let current_ptr = grid.density.current.as_ptr();
        let previous_ptr = grid.density.previous.as_ptr();
        let velocity_ptr = grid.velocity.current[0].as_ptr();

        grid.density.swap();
        grid.velocity.swap();

        assert_eq!(grid.density.previous.as_ptr(), current_ptr);
        assert_eq!(grid.density.current.as_ptr(), previous_ptr);
        assert_eq!(grid.velocity.previous[0].as_ptr(), velocity_ptr);
        assert!(grid.density.previous.iter().all(|v| *v == 1.));
        assert!(grid.density.current.iter().all(|v| *v == 0.));
    }

    #[test]
    fn test_container_cell_clamps() {
        let grid = Grid::new(4, 4, (1., 1.));

        assert_eq!(grid.container_cell(0.0, 0.0), (1, 1));
        assert_eq!(grid.container_cell(0.3, 0.6), (2, 3));
        assert_eq!(grid.container_cell(0.99, 0.26), (4, 2));
        assert_eq!(grid.container_cell(-3., 7.), (1, 4));
        assert_eq!(grid.container_cell(f32::NAN, 1.), (1, 4));
    }

    #[test]
    fn test_sources_and_clearing() {
        let mut grid = Grid::new(4, 4, (1., 1.));

        grid.add_density_source(0.3, 0.6, 1.);
        grid.add_density_source(0.3, 0.6, 0.5);
        grid.add_velocity_source(0.9, 0.1, 2., -3.);

        assert_eq!(grid.density_source[(3, 2)], 1.5);
        assert_eq!(grid.velocity_source[0][(1, 4)], 2.);
        assert_eq!(grid.velocity_source[1][(1, 4)], -3.);

        // sources never reach the simulated buffers directly
        assert!(grid.density().iter().all(|v| *v == 0.));

        grid.density.previous.fill(4.);
        grid.clear_sources();
        grid.clear_prev();

        assert!(grid.density_source.iter().all(|v| *v == 0.));
        assert!(grid.velocity_source[0].iter().all(|v| *v == 0.));
        assert!(grid.density.previous.iter().all(|v| *v == 0.));
    }

    #[test]
    fn test_solid_cells() {
        let mut grid = Grid::new(4, 4, (1., 1.));

        assert_eq!(grid.mark_solid(0.6, 0.1), (3, 1));
        grid.mark_solid(0.6, 0.1);
        grid.mark_solid_cell(9, 0);

        let cells: Vec<_> = grid.solid_cells().iter().copied().collect();
        assert_eq!(cells, vec![(3, 1), (4, 1)]);
    }
}
