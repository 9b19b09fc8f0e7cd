//! The 16 contour patterns stamped by marching squares.
//!
//! Pattern `k` corresponds to the 4-bit corner configuration with top-left
//! worth 8, top-right 4, bottom-right 2 and bottom-left 1.

use crate::core::error::PipelineError;
use crate::core::types::{Dimensions, PixelBuffer, Rgb};
use image::{Rgb as ImageRgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

/// Number of distinct 2x2 corner configurations.
pub const CONTOUR_CONFIG_COUNT: usize = 16;

/// Edge midpoints of a cell, used to describe contour segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Segments drawn for each configuration. Saddles (5 and 10) get two.
const SEGMENTS: [&[(Edge, Edge)]; CONTOUR_CONFIG_COUNT] = [
    &[],
    &[(Edge::Left, Edge::Bottom)],
    &[(Edge::Bottom, Edge::Right)],
    &[(Edge::Left, Edge::Right)],
    &[(Edge::Top, Edge::Right)],
    &[(Edge::Left, Edge::Top), (Edge::Bottom, Edge::Right)],
    &[(Edge::Top, Edge::Bottom)],
    &[(Edge::Left, Edge::Top)],
    &[(Edge::Left, Edge::Top)],
    &[(Edge::Top, Edge::Bottom)],
    &[(Edge::Top, Edge::Right), (Edge::Left, Edge::Bottom)],
    &[(Edge::Top, Edge::Right)],
    &[(Edge::Left, Edge::Right)],
    &[(Edge::Bottom, Edge::Right)],
    &[(Edge::Left, Edge::Bottom)],
    &[],
];

/// Immutable set of 16 equally sized pattern images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContourPatterns {
    patterns: Vec<PixelBuffer>,
    cell: Dimensions,
}

impl ContourPatterns {
    /// Wrap loaded patterns, checking count and uniform size.
    pub fn new(patterns: Vec<PixelBuffer>) -> Result<Self, PipelineError> {
        if patterns.len() != CONTOUR_CONFIG_COUNT {
            return Err(PipelineError::PatternCount {
                expected: CONTOUR_CONFIG_COUNT,
                got: patterns.len(),
            });
        }
        let cell = patterns[0].dimensions();
        if let Some((index, p)) = patterns
            .iter()
            .enumerate()
            .find(|(_, p)| p.dimensions() != cell)
        {
            return Err(PipelineError::PatternSize {
                index,
                expected: cell,
                got: p.dimensions(),
            });
        }
        Ok(Self { patterns, cell })
    }

    /// Render the standard marching-squares line patterns for a cell size:
    /// black segments joining edge midpoints on a white background.
    pub fn generate(step_x: usize, step_y: usize) -> Result<Self, PipelineError> {
        let patterns = (0..CONTOUR_CONFIG_COUNT)
            .map(|k| render_case(k, step_x, step_y))
            .collect();
        Self::new(patterns)
    }

    /// Build patterns where configuration `k` is a solid fill of `color(k)`.
    /// Mostly useful for checking which pattern landed where.
    pub fn solid(
        step_x: usize,
        step_y: usize,
        color: impl Fn(usize) -> Rgb,
    ) -> Result<Self, PipelineError> {
        let mut patterns = Vec::with_capacity(CONTOUR_CONFIG_COUNT);
        for k in 0..CONTOUR_CONFIG_COUNT {
            patterns.push(PixelBuffer::try_filled(step_x, step_y, color(k))?);
        }
        Self::new(patterns)
    }

    /// Pattern for configuration `k`.
    pub fn get(&self, k: usize) -> &PixelBuffer {
        &self.patterns[k]
    }

    /// Shared dimensions of all patterns.
    pub fn cell_size(&self) -> Dimensions {
        self.cell
    }

    /// Fail unless the patterns match the configured cell size.
    pub fn ensure_cell_size(&self, expected: Dimensions) -> Result<(), PipelineError> {
        if self.cell != expected {
            return Err(PipelineError::PatternSize {
                index: 0,
                expected,
                got: self.cell,
            });
        }
        Ok(())
    }

    /// Iterate over patterns in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &PixelBuffer> {
        self.patterns.iter()
    }
}

fn midpoint(edge: Edge, width: usize, height: usize) -> (f32, f32) {
    let right = width.saturating_sub(1) as f32;
    let bottom = height.saturating_sub(1) as f32;
    match edge {
        Edge::Top => (right / 2.0, 0.0),
        Edge::Right => (right, bottom / 2.0),
        Edge::Bottom => (right / 2.0, bottom),
        Edge::Left => (0.0, bottom / 2.0),
    }
}

fn render_case(k: usize, width: usize, height: usize) -> PixelBuffer {
    let mut canvas = RgbImage::from_pixel(width as u32, height as u32, ImageRgb([255, 255, 255]));
    for &(from, to) in SEGMENTS[k] {
        draw_line_segment_mut(
            &mut canvas,
            midpoint(from, width, height),
            midpoint(to, width, height),
            ImageRgb([0, 0, 0]),
        );
    }
    PixelBuffer::from_rgb_image(&canvas)
}
