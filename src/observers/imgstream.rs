use plotters::prelude::*;
use std::{collections::BTreeSet, error::Error, fs, path::Path, sync::mpsc};
use tracing::debug;

use crate::ScalarField;

/// One frame handed from the solver thread to the writer thread
#[derive(Clone)]
pub struct DisplayPacket {
    pub density: ScalarField,
    pub i: usize,
}

/// Render the interior of a padded density field as a grayscale PNG.
/// Intensities are normalised to the frame maximum; solid cells are red.
/// Grid row 1 is the top row of the image.
pub fn image_save(
    density: &ScalarField,
    solid_cells: &BTreeSet<(usize, usize)>,
    filename: &str,
    frames_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    let (rows, cols) = density.shape();
    let (rows, cols) = (rows - 2, cols - 2);

    let filename = frames_dir.join(filename);

    let root = BitMapBackend::new(&filename, (cols as u32, rows as u32)).into_drawing_area();
    root.fill(&WHITE)?;

    let interior = density.view((1, 1), (rows, cols));
    let max = interior.max();
    let scale = if max > 0. { 1. / max } else { 0. };

    for i in 0..rows {
        for j in 0..cols {
            let pixel_color = if solid_cells.contains(&(j + 1, i + 1)) {
                RED
            } else {
                let pixel_mag = (interior[(i, j)] * scale).clamp(0., 1.);
                let pixel_intensity = (254.0 * pixel_mag).floor() as u8;
                RGBColor(pixel_intensity, pixel_intensity, pixel_intensity)
            };

            root.draw_pixel((j as i32, i as i32), &pixel_color)?;
        }
    }
    root.present()?;

    Ok(())
}

/// Write every inbound frame to `frames_dir` until the sender hangs up.
/// The directory is recreated empty first.
pub fn image_io_loop(
    inbound_frames: mpsc::Receiver<DisplayPacket>,
    solid_cells: BTreeSet<(usize, usize)>,
    frames_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    if frames_dir.exists() {
        fs::remove_dir_all(frames_dir)?;
    }
    fs::create_dir_all(frames_dir)?;

    // recv fails once the solver thread drops its sender
    while let Ok(inbound) = inbound_frames.recv() {
        image_save(
            &inbound.density,
            &solid_cells,
            format!("{}.png", inbound.i).as_str(),
            frames_dir,
        )?;
    }

    debug!("Frame writer finished");

    Ok(())
}
