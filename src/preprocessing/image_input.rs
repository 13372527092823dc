/// Handles PNG obstacle input

use image::{GenericImageView, ImageReader, Pixel};
use na::DMatrix;
use std::{error::Error, path::Path};

const THRESHOLD_LUMA: u8 = 127;

/// Load a DMatrix boolean mask from a PNG image by looking at pixel luminosity.
/// Dark pixels are solid.
///
/// Parameters
/// - `image` - The path to the image to process
///
/// Returns
/// - The boolean mask as a Result
pub fn mask_from_image(image: &Path) -> Result<DMatrix<bool>, Box<dyn Error>> {
    let image = ImageReader::open(image)?.decode()?;

    let (nrows, ncols) = (image.height(), image.width());

    let mut mask: DMatrix<bool> = DMatrix::from_element(nrows as usize, ncols as usize, false);

    // load mask
    image.pixels().for_each(|(x, y, color)| {
        mask[(y as usize, x as usize)] = color.to_luma().0[0] < THRESHOLD_LUMA
    });

    Ok(mask)
}

/// Resample a mask of any size onto the interior grid and collect the solid
/// cells. Each cell takes the mask pixel under its centre; mask row 0 maps
/// to grid row 1, matching the frame exporter's orientation.
///
/// Parameters
/// - `mask` - The boolean mask, `true` where solid
/// - `resolution` - The interior cell count (columns, rows)
///
/// Returns
/// - The solid cells as (i, j)
pub fn solid_cells_from_mask(mask: &DMatrix<bool>, resolution: (usize, usize)) -> Vec<(usize, usize)> {
    let (mask_rows, mask_cols) = mask.shape();
    let (columns, rows) = resolution;

    if mask_rows == 0 || mask_cols == 0 {
        return Vec::new();
    }

    let pixel = |cell: usize, cells: usize, pixels: usize| -> usize {
        let centre = (cell as f32 - 0.5) / cells as f32;
        ((centre * pixels as f32).floor() as usize).min(pixels - 1)
    };

    let mut cells = Vec::new();
    for i in 1..=columns {
        for j in 1..=rows {
            if mask[(pixel(j, rows, mask_rows), pixel(i, columns, mask_cols))] {
                cells.push((i, j));
            }
        }
    }

    cells
}
