//! Bicubic resampling of RGB buffers.
//!
//! Each output pixel is a Catmull-Rom cubic combination of the 4x4 source
//! neighborhood around the mapped coordinate. Taps outside the source are
//! clamped to the nearest edge pixel, so sampling never reads out of range.

use crate::core::types::{PixelBuffer, Rgb};

/// Cubic Hermite (Catmull-Rom) interpolation between `p[1]` and `p[2]`.
#[inline]
pub fn cubic_hermite(p: [f32; 4], t: f32) -> f32 {
    let a = -0.5 * p[0] + 1.5 * p[1] - 1.5 * p[2] + 0.5 * p[3];
    let b = p[0] - 2.5 * p[1] + 2.0 * p[2] - 0.5 * p[3];
    let c = -0.5 * p[0] + 0.5 * p[2];
    let d = p[1];

    a * t * t * t + b * t * t + c * t + d
}

#[inline]
fn clamp_index(i: isize, len: usize) -> usize {
    if i < 0 {
        0
    } else {
        (i as usize).min(len - 1)
    }
}

/// Sample `source` at normalized coordinates `(u, v)` in `[0, 1]`.
///
/// `u` spans the width and `v` the height. Panics on an empty source.
pub fn sample_bicubic(source: &PixelBuffer, u: f32, v: f32) -> Rgb {
    let (w, h) = (source.width(), source.height());
    assert!(w > 0 && h > 0, "bicubic sampling of an empty buffer");

    let x = u * w as f32 - 0.5;
    let y = v * h as f32 - 0.5;
    let x_base = x.floor();
    let y_base = y.floor();
    let dx = x - x_base;
    let dy = y - y_base;
    let (col, row) = (x_base as isize, y_base as isize);

    let cols = [-1, 0, 1, 2].map(|o| clamp_index(col + o, w));
    let rows = [-1, 0, 1, 2].map(|o| clamp_index(row + o, h));

    let mut out = [0u8; 3];
    for (channel, slot) in out.iter_mut().enumerate() {
        let mut row_results = [0.0f32; 4];
        for (r, &sy) in rows.iter().enumerate() {
            let window = cols.map(|sx| source.get(sx, sy).channels()[channel] as f32);
            row_results[r] = cubic_hermite(window, dx);
        }
        let value = cubic_hermite(row_results, dy);
        *slot = value.clamp(0.0, 255.0) as u8;
    }
    Rgb::from(out)
}

/// Normalized coordinate of index `i` along an axis of `len` samples.
#[inline]
pub fn normalized(i: usize, len: usize) -> f32 {
    if len <= 1 {
        0.0
    } else {
        i as f32 / (len - 1) as f32
    }
}

/// Fill rows `rows` of `target` by resampling `source`.
///
/// Rows are written through `write`, which receives the row index and the
/// finished row so the caller decides how the destination is shared.
pub fn resample_rows(
    source: &PixelBuffer,
    target_width: usize,
    target_height: usize,
    rows: std::ops::Range<usize>,
    mut write: impl FnMut(usize, &[Rgb]),
) {
    let mut line = vec![Rgb::BLACK; target_width];
    for r in rows {
        let v = normalized(r, target_height);
        for (c, px) in line.iter_mut().enumerate() {
            *px = sample_bicubic(source, normalized(c, target_width), v);
        }
        write(r, &line);
    }
}
