//! Named steps of a pipeline run, used for diagnostics and timing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A step in the per-worker phase sequence.
///
/// Barriers separate `Rescale` from `Release`, `Release` from the sampling
/// steps, and the sampling steps from `Stamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Thread start-up, before the first phase.
    Spawn,
    /// Bicubic fill of the worker's rows of the rescale target.
    Rescale,
    /// Worker 0 releases the original buffer.
    Release,
    /// Stepped sampling of interior grid points.
    SampleInterior,
    /// Rightmost grid column from the image's last column.
    SampleRightEdge,
    /// Worker 0 fills the last grid row from the image's last row.
    SampleBottomEdge,
    /// Pattern stamping into the output image.
    Stamp,
    /// Joining workers at the end of the run.
    Join,
}

impl Stage {
    /// Whether only worker 0 executes this stage.
    pub fn is_solo(&self) -> bool {
        matches!(self, Stage::Release | Stage::SampleBottomEdge)
    }

    /// Short machine-friendly name.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Spawn => "spawn",
            Stage::Rescale => "rescale",
            Stage::Release => "release",
            Stage::SampleInterior => "sample_interior",
            Stage::SampleRightEdge => "sample_right_edge",
            Stage::SampleBottomEdge => "sample_bottom_edge",
            Stage::Stamp => "stamp",
            Stage::Join => "join",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
