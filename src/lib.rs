extern crate nalgebra as na;

pub mod observers;
pub mod preprocessing;
pub mod sim;

use na::DMatrix;

/// A padded 2D field. Rows run along y, columns along x.
pub type ScalarField = DMatrix<f32>;

/// An (x, y) pair of scalar fields sharing one shape.
pub type VectorField = [ScalarField; 2];
