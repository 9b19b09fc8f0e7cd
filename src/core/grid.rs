//! Binary occupancy grid produced by the sampling phase.

use crate::core::error::PipelineError;
use crate::core::types::Dimensions;

/// Contiguous 2-D binary matrix, indexed `[row][col]` at `row * cols + col`.
///
/// Row `i` holds samples taken at pixel row `i * step_y`, column `j` at
/// pixel column `j * step_x`; the last row and column sample the image's
/// outer edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

impl OccupancyGrid {
    /// Allocate a zeroed grid with the given shape.
    pub fn try_new(rows: usize, cols: usize) -> Result<Self, PipelineError> {
        let len = rows.checked_mul(cols).ok_or(PipelineError::ResourceExhaustion {
            what: "occupancy grid",
            bytes: usize::MAX,
        })?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| PipelineError::ResourceExhaustion {
                what: "occupancy grid",
                bytes: len,
            })?;
        cells.resize(len, 0);
        Ok(Self { rows, cols, cells })
    }

    /// Allocate the grid covering an image of `image` size sampled every
    /// `step_x` by `step_y` pixels: `height / step_y + 1` rows and
    /// `width / step_x + 1` columns.
    pub fn for_image(
        image: Dimensions,
        step_x: usize,
        step_y: usize,
    ) -> Result<Self, PipelineError> {
        Self::try_new(image.height / step_y + 1, image.width / step_x + 1)
    }

    /// Number of rows, including the bottom edge row.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns, including the right edge column.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of full cell rows that get stamped.
    pub fn cell_rows(&self) -> usize {
        self.rows - 1
    }

    /// Number of full cell columns that get stamped.
    pub fn cell_cols(&self) -> usize {
        self.cols - 1
    }

    /// Linear index of `(row, col)`.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "grid cell [{row}][{col}] outside {}x{}",
            self.rows,
            self.cols
        );
        row * self.cols + col
    }

    /// Cell value, 0 or 1.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[self.index(row, col)]
    }

    /// Set a cell.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, bit: u8) {
        let idx = self.index(row, col);
        self.cells[idx] = bit;
    }

    /// One full row.
    pub fn row(&self, row: usize) -> &[u8] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    /// Count of set cells.
    pub fn count_set(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }
}
