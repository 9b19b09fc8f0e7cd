//! Error types for isomarch.
//!
//! Uses thiserror for structured errors with context. Pipeline errors carry
//! the stage and worker id so a fatal failure can be traced to where it
//! happened. None of them is recoverable: a run either completes or fails.

use crate::core::stage::Stage;
use crate::core::types::Dimensions;
use thiserror::Error;

/// Top-level error type for isomarch.
#[derive(Error, Debug)]
pub enum IsomarchError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read image '{path}': {error}")]
    ReadImage { path: String, error: image::ImageError },

    #[error("Failed to write image '{path}': {error}")]
    WriteImage { path: String, error: image::ImageError },
}

/// Errors raised by the contour pipeline itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Unable to allocate {bytes} bytes for {what}")]
    ResourceExhaustion { what: &'static str, bytes: usize },

    #[error("Worker {worker} failed during {stage}: {reason}")]
    ConcurrencyFault {
        stage: Stage,
        worker: usize,
        reason: String,
    },

    #[error("Thread count must be at least 1, got {0}")]
    InvalidThreadCount(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Expected {expected} contour patterns, got {got}")]
    PatternCount { expected: usize, got: usize },

    #[error("Contour pattern {index} is {got}, expected {expected}")]
    PatternSize {
        index: usize,
        expected: Dimensions,
        got: Dimensions,
    },

    #[error("Input image {0} has no pixels")]
    EmptyImage(Dimensions),
}

/// Errors while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {error}")]
    Read { path: String, error: std::io::Error },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl PipelineError {
    /// Stage in which the error occurred, if it happened inside a worker.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::ConcurrencyFault { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Worker id that reported the error, if any.
    pub fn worker(&self) -> Option<usize> {
        match self {
            PipelineError::ConcurrencyFault { worker, .. } => Some(*worker),
            _ => None,
        }
    }

    /// Whether the error stems from bad inputs rather than the runtime.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidThreadCount(_)
                | PipelineError::InvalidConfig(_)
                | PipelineError::EmptyImage(_)
                | PipelineError::PatternCount { .. }
                | PipelineError::PatternSize { .. }
        )
    }
}

/// Result type alias for isomarch operations.
pub type IsomarchResult<T> = Result<T, IsomarchError>;

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
