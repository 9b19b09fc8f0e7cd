//! Pipeline configuration.
//!
//! The sampling step, binarization threshold and rescale geometry are fixed
//! for a run and passed to the orchestrator up front.
//!
//! # Example
//!
//! ```
//! use isomarch::core::config::PipelineConfig;
//!
//! let config = PipelineConfig::new()
//!     .with_step(16, 16)
//!     .with_sigma(128);
//! assert!(config.validate().is_ok());
//! ```

use crate::core::error::{ConfigError, PipelineError};
use crate::core::types::Dimensions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default sampling step in both directions.
pub const DEFAULT_STEP: usize = 8;

/// Default luma threshold.
pub const DEFAULT_SIGMA: u8 = 200;

/// Default rescale threshold and target edge length.
pub const DEFAULT_RESCALE_EDGE: usize = 2048;

/// Fixed parameters of a contour run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Horizontal distance between grid sample points, and pattern width.
    pub step_x: usize,
    /// Vertical distance between grid sample points, and pattern height.
    pub step_y: usize,
    /// Mean channel value above which a sample counts as light (unset).
    pub sigma: u8,
    /// Inputs larger than this in either dimension are rescaled.
    pub rescale_threshold: Dimensions,
    /// Size of the buffer produced by rescaling.
    pub rescale_target: Dimensions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            step_x: DEFAULT_STEP,
            step_y: DEFAULT_STEP,
            sigma: DEFAULT_SIGMA,
            rescale_threshold: Dimensions::new(DEFAULT_RESCALE_EDGE, DEFAULT_RESCALE_EDGE),
            rescale_target: Dimensions::new(DEFAULT_RESCALE_EDGE, DEFAULT_RESCALE_EDGE),
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sampling step.
    pub fn with_step(mut self, step_x: usize, step_y: usize) -> Self {
        self.step_x = step_x;
        self.step_y = step_y;
        self
    }

    /// Set the binarization threshold.
    pub fn with_sigma(mut self, sigma: u8) -> Self {
        self.sigma = sigma;
        self
    }

    /// Set the dimensions above which rescaling kicks in.
    pub fn with_rescale_threshold(mut self, width: usize, height: usize) -> Self {
        self.rescale_threshold = Dimensions::new(width, height);
        self
    }

    /// Set the dimensions of the rescaled buffer.
    pub fn with_rescale_target(mut self, width: usize, height: usize) -> Self {
        self.rescale_target = Dimensions::new(width, height);
        self
    }

    /// Size of one contour pattern.
    pub fn cell_size(&self) -> Dimensions {
        Dimensions::new(self.step_x, self.step_y)
    }

    /// Check whether an image of the given size gets rescaled.
    pub fn needs_rescale(&self, width: usize, height: usize) -> bool {
        width > self.rescale_threshold.width || height > self.rescale_threshold.height
    }

    /// Dimensions the pipeline works on for an input of the given size.
    pub fn working_dimensions(&self, width: usize, height: usize) -> Dimensions {
        if self.needs_rescale(width, height) {
            self.rescale_target
        } else {
            Dimensions::new(width, height)
        }
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.step_x == 0 || self.step_y == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "step must be positive, got {}x{}",
                self.step_x, self.step_y
            )));
        }
        if self.rescale_target.area() == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "rescale target {} has no pixels",
                self.rescale_target
            )));
        }
        Ok(())
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(source)?;
        config.validate().map_err(|e| ConfigError::InvalidValue {
            field: "step_x/step_y/rescale_target",
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.display().to_string(),
            error,
        })?;
        Self::from_toml_str(&source)
    }
}
