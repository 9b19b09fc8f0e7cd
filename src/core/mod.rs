//! Core types for the isomarch contour pipeline.
//!
//! This module contains the foundational pieces every phase works with:
//! - Pixel buffers and dimensions
//! - The occupancy grid
//! - The contour pattern set
//! - Pipeline configuration
//! - Error types and stage names

pub mod types;
pub mod grid;
pub mod patterns;
pub mod config;
pub mod error;
pub mod stage;

// Re-export commonly used types
pub use types::{Dimensions, PixelBuffer, Rgb};
pub use grid::OccupancyGrid;
pub use patterns::{ContourPatterns, CONTOUR_CONFIG_COUNT};
pub use config::PipelineConfig;
pub use error::{ConfigError, IsomarchError, IsomarchResult, PipelineError, PipelineResult};
pub use stage::Stage;
