//! Execution module.
//!
//! This module runs the contour pipeline: work partitioning, the per-phase
//! kernels, and the barrier-synchronized orchestrator that drives them.

pub mod partition;
pub mod resample;
pub mod sampling;
pub mod stamp;
pub mod shared;
pub mod progress;
pub mod orchestrator;

pub use orchestrator::{run, ImageSlot, Phase, PhaseOrchestrator, RunOutput};
pub use partition::{partition, partitions};
pub use progress::{PhaseCallback, PhaseTiming, PhaseTracker, PhaseUpdate, RunStats};
pub use sampling::{classify, GridSampler};
