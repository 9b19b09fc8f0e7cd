//! # Isomarch - Parallel Marching-Squares Contours
//!
//! Isomarch turns an RGB image into a contour image. The image is sampled on a
//! regular grid, every sample is binarized against a brightness threshold, and
//! each grid cell is replaced by one of 16 pattern images chosen from its four
//! corner bits.
//!
//! ## Features
//!
//! - **Barrier-synchronized workers**: a fixed pool of threads runs every
//!   phase over disjoint row ranges, with one reusable barrier between phases
//! - **Bicubic rescaling**: oversized inputs are resampled before contouring
//!   and the original buffer is released as soon as it is no longer read
//! - **Deterministic output**: results are identical for any thread count
//! - **Configurable**: step, threshold and rescale limits load from TOML
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use isomarch::prelude::*;
//!
//! # fn main() -> IsomarchResult<()> {
//! let config = PipelineConfig::default();
//! let patterns = ContourPatterns::generate(config.step_x, config.step_y)?;
//! let image = isomarch::io::read_image("input.ppm")?;
//!
//! let output = PhaseOrchestrator::new(config, 4)?.run(image, &patterns)?;
//! isomarch::io::write_image(&output.image, "output.ppm")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: pixel buffers, the occupancy grid, patterns, configuration, errors
//! - [`execution`]: partitioning, phase kernels and the orchestrator
//! - [`io`]: image and pattern files

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod execution;
pub mod io;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use isomarch::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{Dimensions, PixelBuffer, PixelView, Rgb};
    pub use crate::core::grid::OccupancyGrid;
    pub use crate::core::patterns::{ContourPatterns, CONTOUR_CONFIG_COUNT};
    pub use crate::core::config::PipelineConfig;
    pub use crate::core::stage::Stage;

    // Errors
    pub use crate::core::error::{
        ConfigError, IsomarchError, IsomarchResult, PipelineError, PipelineResult,
    };

    // Execution
    pub use crate::execution::orchestrator::{run, PhaseOrchestrator, RunOutput};
    pub use crate::execution::progress::{PhaseCallback, PhaseUpdate, RunStats};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "isomarch");
    }

    #[test]
    fn test_generated_patterns_match_default_step() {
        let config = PipelineConfig::default();
        let patterns = ContourPatterns::generate(config.step_x, config.step_y).unwrap();
        assert_eq!(patterns.cell_size(), config.cell_size());
    }

    #[test]
    fn test_white_image_stays_blank() {
        let config = PipelineConfig::default();
        let patterns = ContourPatterns::generate(config.step_x, config.step_y).unwrap();
        let image = PixelBuffer::try_filled(32, 24, Rgb::WHITE).unwrap();
        let out = run(image.clone(), &patterns, 3, config).unwrap();
        assert_eq!(out, image);
    }
}
