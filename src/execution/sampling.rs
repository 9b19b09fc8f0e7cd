//! Binarization of an image into the occupancy grid.
//!
//! Interior grid points sample the pixel at the top-left corner of their
//! cell. Points on the last column and last row have no cell to the right or
//! below, so they sample the image's last pixel column and row instead. The
//! bottom-right corner always samples the image's last pixel.

use crate::core::types::{PixelView, Rgb};
use std::ops::Range;

/// Classify one pixel: 1 (set, dark) when its mean channel value is at most
/// `sigma`, 0 (unset, light) when it is strictly greater.
#[inline]
pub fn classify(pixel: Rgb, sigma: u8) -> u8 {
    if pixel.luma() > sigma {
        0
    } else {
        1
    }
}

/// Sampling geometry shared by every worker in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSampler {
    /// Horizontal step between samples.
    pub step_x: usize,
    /// Vertical step between samples.
    pub step_y: usize,
    /// Binarization threshold.
    pub sigma: u8,
}

impl GridSampler {
    /// Create a sampler.
    pub fn new(step_x: usize, step_y: usize, sigma: u8) -> Self {
        Self { step_x, step_y, sigma }
    }

    /// Number of full cell rows for an image of `height` pixels.
    pub fn cell_rows(&self, height: usize) -> usize {
        height / self.step_y
    }

    /// Number of full cell columns for an image of `width` pixels.
    pub fn cell_cols(&self, width: usize) -> usize {
        width / self.step_x
    }

    /// Classify interior points of grid rows `rows`, columns `0..cell_cols`.
    pub fn sample_interior(
        &self,
        image: &PixelView<'_>,
        rows: Range<usize>,
        mut set: impl FnMut(usize, usize, u8),
    ) {
        let cols = self.cell_cols(image.width());
        for i in rows {
            let y = i * self.step_y;
            for j in 0..cols {
                set(i, j, classify(image.get(j * self.step_x, y), self.sigma));
            }
        }
    }

    /// Classify the last grid column for grid rows `rows` from the image's
    /// last pixel column.
    pub fn sample_right_edge(
        &self,
        image: &PixelView<'_>,
        rows: Range<usize>,
        mut set: impl FnMut(usize, usize, u8),
    ) {
        let last_col = self.cell_cols(image.width());
        let x = image.width() - 1;
        for i in rows {
            set(i, last_col, classify(image.get(x, i * self.step_y), self.sigma));
        }
    }

    /// Classify the whole last grid row from the image's last pixel row,
    /// including the bottom-right corner.
    pub fn sample_bottom_edge(&self, image: &PixelView<'_>, mut set: impl FnMut(usize, usize, u8)) {
        let last_row = self.cell_rows(image.height());
        let last_col = self.cell_cols(image.width());
        let y = image.height() - 1;
        for j in 0..last_col {
            set(last_row, j, classify(image.get(j * self.step_x, y), self.sigma));
        }
        let corner = image.get(image.width() - 1, y);
        set(last_row, last_col, classify(corner, self.sigma));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::OccupancyGrid;
    use crate::core::types::{Dimensions, PixelBuffer};
    use proptest::prelude::*;

    fn sample_all(image: &PixelBuffer, sampler: &GridSampler) -> OccupancyGrid {
        let mut grid =
            OccupancyGrid::for_image(image.dimensions(), sampler.step_x, sampler.step_y).unwrap();
        let view = image.as_view();
        let rows = 0..sampler.cell_rows(image.height());
        sampler.sample_interior(&view, rows.clone(), |i, j, b| grid.set(i, j, b));
        sampler.sample_right_edge(&view, rows, |i, j, b| grid.set(i, j, b));
        sampler.sample_bottom_edge(&view, |i, j, b| grid.set(i, j, b));
        grid
    }

    #[test]
    fn test_classify_threshold_boundary() {
        assert_eq!(classify(Rgb::gray(200), 200), 1);
        assert_eq!(classify(Rgb::gray(201), 200), 0);
        assert_eq!(classify(Rgb::BLACK, 0), 1);
        assert_eq!(classify(Rgb::WHITE, 255), 1);
        // Integer mean of (255, 255, 92) is 200.
        assert_eq!(classify(Rgb::new(255, 255, 92), 200), 1);
    }

    #[test]
    fn test_black_image_sets_every_cell() {
        let image = PixelBuffer::try_new(16, 16).unwrap();
        let grid = sample_all(&image, &GridSampler::new(8, 8, 128));
        assert_eq!((grid.rows(), grid.cols()), (3, 3));
        assert!(grid.cells().iter().all(|&c| c == 1));
    }

    #[test]
    fn test_edges_use_last_row_and_column() {
        // Only the last pixel row and column are dark.
        let image = PixelBuffer::from_fn(16, 16, |x, y| {
            if x == 15 || y == 15 {
                Rgb::BLACK
            } else {
                Rgb::WHITE
            }
        });
        let grid = sample_all(&image, &GridSampler::new(8, 8, 128));
        for i in 0..3 {
            for j in 0..3 {
                let on_edge = i == 2 || j == 2;
                assert_eq!(grid.get(i, j), on_edge as u8, "cell [{i}][{j}]");
            }
        }
    }

    #[test]
    fn test_corner_uses_last_pixel() {
        let image = PixelBuffer::from_fn(9, 9, |x, y| {
            if x == 8 && y == 8 {
                Rgb::BLACK
            } else {
                Rgb::WHITE
            }
        });
        let grid = sample_all(&image, &GridSampler::new(4, 4, 100));
        assert_eq!(grid.count_set(), 1);
        assert_eq!(grid.get(2, 2), 1);
    }

    #[test]
    fn test_interior_samples_cell_corner() {
        let image = PixelBuffer::from_fn(8, 8, |x, y| {
            if x == 4 && y == 0 {
                Rgb::BLACK
            } else {
                Rgb::WHITE
            }
        });
        let sampler = GridSampler::new(4, 4, 100);
        let grid = sample_all(&image, &sampler);
        assert_eq!(grid.get(0, 1), 1);
        assert_eq!(grid.count_set(), 1);
        assert_eq!(grid.rows(), 3);
        assert_eq!(OccupancyGrid::for_image(Dimensions::new(8, 8), 4, 4).unwrap().cols(), 3);
    }

    proptest! {
        #[test]
        fn prop_classify_monotonic_in_sigma(r: u8, g: u8, b: u8, s1: u8, s2: u8) {
            let (lo, hi) = if s1 <= s2 { (s1, s2) } else { (s2, s1) };
            let px = Rgb::new(r, g, b);
            // Raising sigma never unsets a set cell.
            prop_assert!(classify(px, hi) >= classify(px, lo));
        }
    }
}
