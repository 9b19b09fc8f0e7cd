//! Buffers shared by every worker and written in disjoint ranges.
//!
//! Workers only write indices inside their own partition during a phase, and
//! only read other workers' indices after the barrier that ends that phase.
//! The barrier is the happens-before edge that makes those reads see the
//! writes.

use crate::core::error::{PipelineError, PipelineResult};
use crate::core::grid::OccupancyGrid;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, Ordering};

/// Occupancy grid that workers fill concurrently.
///
/// Same shape and indexing as [`OccupancyGrid`]. Cells are atomics, so
/// writes need no `unsafe`; relaxed ordering is enough because the barrier
/// after the sampling phase orders every store before the stamping loads.
pub struct SharedGrid {
    rows: usize,
    cols: usize,
    cells: Vec<AtomicU8>,
}

impl SharedGrid {
    /// Allocate a zeroed grid with the same shape as `grid`.
    pub fn shaped_like(grid: &OccupancyGrid) -> PipelineResult<Self> {
        let (rows, cols) = (grid.rows(), grid.cols());
        let len = grid.cells().len();
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| PipelineError::ResourceExhaustion {
                what: "occupancy grid",
                bytes: len,
            })?;
        cells.resize_with(len, || AtomicU8::new(0));
        Ok(Self { rows, cols, cells })
    }

    /// Number of grid rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of grid columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Store `bit` at `(row, col)`. Panics when out of bounds.
    #[inline]
    pub fn set(&self, row: usize, col: usize, bit: u8) {
        assert!(row < self.rows && col < self.cols, "cell [{row}][{col}] out of bounds");
        self.cells[row * self.cols + col].store(bit, Ordering::Relaxed);
    }

    /// Load the bit at `(row, col)`. Panics when out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        assert!(row < self.rows && col < self.cols, "cell [{row}][{col}] out of bounds");
        self.cells[row * self.cols + col].load(Ordering::Relaxed)
    }

    /// Copy the finished cells into `grid`, which must have the same shape.
    pub fn store_into(self, grid: &mut OccupancyGrid) {
        assert_eq!(
            (grid.rows(), grid.cols()),
            (self.rows, self.cols),
            "grid shape mismatch"
        );
        for (dst, src) in grid.cells_mut().iter_mut().zip(self.cells) {
            *dst = src.into_inner();
        }
    }
}

/// Shared view of a mutable slice whose elements are written by several
/// threads, each in its own index range.
pub struct DisjointSlice<'a, T> {
    ptr: *mut T,
    len: usize,
    _borrow: PhantomData<&'a mut [T]>,
}

// SAFETY: the view is only a pointer plus length; data-race freedom is the
// caller's obligation on every access method below.
unsafe impl<T: Send> Send for DisjointSlice<'_, T> {}
unsafe impl<T: Send + Sync> Sync for DisjointSlice<'_, T> {}

impl<'a, T: Copy> DisjointSlice<'a, T> {
    /// Take exclusive ownership of `slice` for the lifetime of the view.
    pub fn new(slice: &'a mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
            _borrow: PhantomData,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy `values` into `index..index + values.len()`. Panics when the
    /// range is out of bounds.
    ///
    /// # Safety
    ///
    /// No other thread may read or write any touched index until a
    /// synchronization point (barrier or join) separates this write from
    /// that access.
    #[inline]
    pub unsafe fn write_slice(&self, index: usize, values: &[T]) {
        assert!(
            index <= self.len && values.len() <= self.len - index,
            "range {index}..{} out of bounds for {}",
            index + values.len(),
            self.len
        );
        std::ptr::copy_nonoverlapping(values.as_ptr(), self.ptr.add(index), values.len());
    }

    /// Borrow the whole slice for reading.
    ///
    /// # Safety
    ///
    /// No thread may write any element while the returned slice is alive.
    #[inline]
    pub unsafe fn as_slice(&self) -> &[T] {
        std::slice::from_raw_parts(self.ptr, self.len)
    }
}
