//! Image and contour pattern files.
//!
//! Decoding and encoding go through the `image` crate; the format is picked
//! from the file extension. Patterns live in a directory as `0.ppm` through
//! `15.ppm`, one file per marching-squares configuration.

use crate::core::error::{IsomarchError, IsomarchResult};
use crate::core::patterns::{ContourPatterns, CONTOUR_CONFIG_COUNT};
use crate::core::types::PixelBuffer;
use log::{debug, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Decode an image file into an RGB buffer. Alpha and higher bit depths are
/// dropped.
pub fn read_image(path: impl AsRef<Path>) -> IsomarchResult<PixelBuffer> {
    let path = path.as_ref();
    let decoded = image::open(path).map_err(|error| IsomarchError::ReadImage {
        path: path.display().to_string(),
        error,
    })?;
    let buffer = PixelBuffer::from_rgb_image(&decoded.to_rgb8());
    debug!("read {} ({})", path.display(), buffer.dimensions());
    Ok(buffer)
}

/// Encode `image` to `path`.
pub fn write_image(image: &PixelBuffer, path: impl AsRef<Path>) -> IsomarchResult<()> {
    let path = path.as_ref();
    image
        .to_rgb_image()
        .save(path)
        .map_err(|error| IsomarchError::WriteImage {
            path: path.display().to_string(),
            error,
        })?;
    debug!("wrote {} ({})", path.display(), image.dimensions());
    Ok(())
}

/// Path of the pattern file for configuration `k`.
pub fn pattern_path(dir: impl AsRef<Path>, k: usize) -> PathBuf {
    dir.as_ref().join(format!("{k}.ppm"))
}

/// Load the 16 contour patterns from `dir`.
pub fn load_contour_patterns(dir: impl AsRef<Path>) -> IsomarchResult<ContourPatterns> {
    let dir = dir.as_ref();
    let patterns = (0..CONTOUR_CONFIG_COUNT)
        .into_par_iter()
        .map(|k| read_image(pattern_path(dir, k)))
        .collect::<IsomarchResult<Vec<_>>>()?;
    let patterns = ContourPatterns::new(patterns)?;
    info!("loaded contour patterns from {} ({})", dir.display(), patterns.cell_size());
    Ok(patterns)
}

/// Write `patterns` into `dir` using the layout [`load_contour_patterns`] reads.
pub fn save_contour_patterns(
    patterns: &ContourPatterns,
    dir: impl AsRef<Path>,
) -> IsomarchResult<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    (0..CONTOUR_CONFIG_COUNT)
        .into_par_iter()
        .try_for_each(|k| write_image(patterns.get(k), pattern_path(dir, k)))
}
