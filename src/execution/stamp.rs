//! Marching-squares lookup and pattern stamping.

use crate::core::grid::OccupancyGrid;
use crate::core::types::{PixelBuffer, Rgb};

/// 4-bit configuration of the 2x2 neighborhood whose top-left corner is
/// grid cell `(i, j)`: top-left 8, top-right 4, bottom-right 2, bottom-left 1.
#[inline]
pub fn configuration(grid: &OccupancyGrid, i: usize, j: usize) -> usize {
    configuration_with(|r, c| grid.get(r, c), i, j)
}

/// Same as [`configuration`] with an arbitrary cell reader.
#[inline]
pub fn configuration_with(cell: impl Fn(usize, usize) -> u8, i: usize, j: usize) -> usize {
    8 * cell(i, j) as usize
        + 4 * cell(i, j + 1) as usize
        + 2 * cell(i + 1, j + 1) as usize
        + cell(i + 1, j) as usize
}

/// Copy `pattern` into `target` with its top-left corner at `(origin_x, origin_y)`.
///
/// The caller guarantees the pattern fits; a write region that would leave
/// the target panics instead of clipping.
pub fn stamp(target: &mut PixelBuffer, pattern: &PixelBuffer, origin_x: usize, origin_y: usize) {
    let width = target.width();
    let height = target.height();
    stamp_rows(width, height, pattern, origin_x, origin_y, |offset, row| {
        target.pixels_mut()[offset..offset + row.len()].copy_from_slice(row);
    });
}

/// Stamp through a row writer: `write(offset, row)` receives the linear
/// offset in a `target_width x target_height` buffer and one pattern row.
pub fn stamp_rows(
    target_width: usize,
    target_height: usize,
    pattern: &PixelBuffer,
    origin_x: usize,
    origin_y: usize,
    mut write: impl FnMut(usize, &[Rgb]),
) {
    let (pw, ph) = (pattern.width(), pattern.height());
    assert!(
        origin_x + pw <= target_width && origin_y + ph <= target_height,
        "pattern {pw}x{ph} at ({origin_x}, {origin_y}) exceeds {target_width}x{target_height}"
    );
    for (dy, row) in pattern.pixels().chunks_exact(pw.max(1)).take(ph).enumerate() {
        write((origin_y + dy) * target_width + origin_x, row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_weights() {
        let mut grid = OccupancyGrid::try_new(2, 2).unwrap();
        assert_eq!(configuration(&grid, 0, 0), 0);
        grid.set(0, 0, 1);
        assert_eq!(configuration(&grid, 0, 0), 8);
        grid.set(0, 1, 1);
        assert_eq!(configuration(&grid, 0, 0), 12);
        grid.set(1, 1, 1);
        assert_eq!(configuration(&grid, 0, 0), 14);
        grid.set(1, 0, 1);
        assert_eq!(configuration(&grid, 0, 0), 15);

        let mut grid = OccupancyGrid::try_new(2, 2).unwrap();
        grid.set(1, 0, 1);
        assert_eq!(configuration(&grid, 0, 0), 1);
    }

    #[test]
    fn test_stamp_copies_at_offset() {
        let mut target = PixelBuffer::try_filled(6, 5, Rgb::WHITE).unwrap();
        let pattern = PixelBuffer::from_fn(2, 3, |x, y| Rgb::new(x as u8, y as u8, 1));
        stamp(&mut target, &pattern, 3, 1);
        for y in 0..5 {
            for x in 0..6 {
                let expected = if (3..5).contains(&x) && (1..4).contains(&y) {
                    Rgb::new((x - 3) as u8, (y - 1) as u8, 1)
                } else {
                    Rgb::WHITE
                };
                assert_eq!(target.get(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_stamp_flush_with_corner() {
        let mut target = PixelBuffer::try_new(4, 4).unwrap();
        let pattern = PixelBuffer::try_filled(2, 2, Rgb::WHITE).unwrap();
        stamp(&mut target, &pattern, 2, 2);
        assert_eq!(target.get(3, 3), Rgb::WHITE);
        assert_eq!(target.get(1, 1), Rgb::BLACK);
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn test_stamp_out_of_bounds_fails_fast() {
        let mut target = PixelBuffer::try_new(4, 4).unwrap();
        let pattern = PixelBuffer::try_new(2, 2).unwrap();
        stamp(&mut target, &pattern, 3, 0);
    }
}
