//! Core value types that flow through the contour pipeline.
//!
//! A [`PixelBuffer`] is plain data: dimensions plus a row-major sequence of
//! [`Rgb`] triples. Conversion to and from the `image` crate lives here so the
//! rest of the pipeline never touches codec types.

use crate::core::error::PipelineError;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single 8-bit RGB pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Pure black.
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    /// Pure white.
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    /// Create a pixel from its three channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a gray pixel with all channels set to `value`.
    pub const fn gray(value: u8) -> Self {
        Self::new(value, value, value)
    }

    /// Channels as an array, in `[r, g, b]` order.
    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Unweighted integer mean of the three channels.
    pub fn luma(&self) -> u8 {
        ((self.r as u16 + self.g as u16 + self.b as u16) / 3) as u8
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

/// Width and height of a buffer, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

impl Dimensions {
    /// Create a new dimension pair.
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total number of pixels.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Owned RGB raster, row-major.
///
/// Invariant: `pixels.len() == width * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl PixelBuffer {
    /// Allocate a buffer filled with `fill`.
    ///
    /// Uses a fallible reservation so an oversized request is reported as
    /// [`PipelineError::ResourceExhaustion`] instead of aborting in the allocator.
    pub fn try_filled(width: usize, height: usize, fill: Rgb) -> Result<Self, PipelineError> {
        let len = width.checked_mul(height).ok_or(PipelineError::ResourceExhaustion {
            what: "pixel buffer",
            bytes: usize::MAX,
        })?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| PipelineError::ResourceExhaustion {
                what: "pixel buffer",
                bytes: len.saturating_mul(std::mem::size_of::<Rgb>()),
            })?;
        pixels.resize(len, fill);
        Ok(Self { width, height, pixels })
    }

    /// Allocate a black buffer.
    pub fn try_new(width: usize, height: usize) -> Result<Self, PipelineError> {
        Self::try_filled(width, height, Rgb::BLACK)
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> Rgb) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self { width, height, pixels }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Width and height together.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Row-major index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Pixel at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Rgb {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}",
            self.dimensions()
        );
        self.pixels[self.index(x, y)]
    }

    /// Overwrite the pixel at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: Rgb) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}",
            self.dimensions()
        );
        let idx = self.index(x, y);
        self.pixels[idx] = value;
    }

    /// Raw pixel slice.
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Mutable raw pixel slice.
    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }

    /// Borrow the buffer as a read-only view.
    pub fn as_view(&self) -> PixelView<'_> {
        PixelView {
            width: self.width,
            height: self.height,
            pixels: &self.pixels,
        }
    }

    /// Convert from an `image` crate RGB buffer.
    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let pixels = image.pixels().map(|p| Rgb::from(p.0)).collect();
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            pixels,
        }
    }

    /// Convert into an `image` crate RGB buffer.
    pub fn to_rgb_image(&self) -> RgbImage {
        let raw: Vec<u8> = self.pixels.iter().flat_map(|p| p.channels()).collect();
        // Length always matches because of the buffer invariant.
        RgbImage::from_raw(self.width as u32, self.height as u32, raw)
            .unwrap_or_else(|| RgbImage::new(self.width as u32, self.height as u32))
    }
}

/// Borrowed read-only view of row-major RGB pixels.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    width: usize,
    height: usize,
    pixels: &'a [Rgb],
}

impl<'a> PixelView<'a> {
    /// Wrap a slice already known to hold `width * height` pixels.
    pub(crate) fn from_parts(width: usize, height: usize, pixels: &'a [Rgb]) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        Self { width, height, pixels }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Rgb {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{}",
            self.width,
            self.height
        );
        self.pixels[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_reads_buffer() {
        let buf = PixelBuffer::from_fn(3, 2, |x, y| Rgb::new(x as u8, y as u8, 0));
        let view = buf.as_view();
        assert_eq!((view.width(), view.height()), (3, 2));
        assert_eq!(view.get(2, 1), Rgb::new(2, 1, 0));
    }

    #[test]
    fn test_luma_is_integer_mean() {
        assert_eq!(Rgb::new(0, 0, 0).luma(), 0);
        assert_eq!(Rgb::new(255, 255, 255).luma(), 255);
        assert_eq!(Rgb::new(10, 20, 31).luma(), 20);
        assert_eq!(Rgb::new(255, 255, 254).luma(), 254);
    }

    #[test]
    fn test_row_major_layout() {
        let buf = PixelBuffer::from_fn(3, 2, |x, y| Rgb::gray((y * 3 + x) as u8));
        assert_eq!(buf.pixels().len(), 6);
        assert_eq!(buf.get(2, 1), Rgb::gray(5));
        assert_eq!(buf.index(1, 1), 4);
    }

    #[test]
    fn test_rgb_image_conversion() {
        let buf = PixelBuffer::from_fn(4, 3, |x, y| Rgb::new(x as u8, y as u8, 7));
        let img = buf.to_rgb_image();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(3, 2).0, [3, 2, 7]);
        assert_eq!(PixelBuffer::from_rgb_image(&img), buf);
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_bounds_panics() {
        let buf = PixelBuffer::try_new(2, 2).unwrap();
        buf.get(2, 0);
    }
}
