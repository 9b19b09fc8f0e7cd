//! Phase timing and progress reporting for a run.

use crate::core::stage::Stage;
use crate::core::types::Dimensions;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A progress update event.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseUpdate {
    /// Workers are about to start.
    RunStarted {
        input: Dimensions,
        working: Dimensions,
        threads: usize,
    },
    /// A worker finished one stage.
    PhaseCompleted {
        worker: usize,
        stage: Stage,
        units: usize,
        duration: Duration,
    },
    /// The original buffer was released and replaced by the rescaled one.
    Rescaled { from: Dimensions, to: Dimensions },
    /// All workers joined.
    RunCompleted { duration: Duration },
}

/// Callback type for progress updates.
pub type PhaseCallback = Box<dyn Fn(&PhaseUpdate) + Send + Sync>;

/// Time spent by one worker in one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTiming {
    /// Worker id.
    pub worker: usize,
    /// Stage that was timed.
    pub stage: Stage,
    /// Units (rows or cells) processed.
    pub units: usize,
    /// Wall time spent in the stage, excluding barrier waits.
    pub duration: Duration,
}

/// Records per-worker stage timings and forwards events to an optional callback.
pub struct PhaseTracker {
    start_time: Instant,
    completed: AtomicUsize,
    timings: parking_lot::Mutex<Vec<PhaseTiming>>,
    callback: Option<Arc<PhaseCallback>>,
}

impl PhaseTracker {
    /// Create a tracker; the clock starts now.
    pub fn new(callback: Option<Arc<PhaseCallback>>) -> Self {
        Self {
            start_time: Instant::now(),
            completed: AtomicUsize::new(0),
            timings: parking_lot::Mutex::new(Vec::new()),
            callback,
        }
    }

    /// Report an event to the callback, if any.
    pub fn send_update(&self, update: PhaseUpdate) {
        if let Some(callback) = &self.callback {
            (callback.as_ref())(&update);
        }
    }

    /// Run `f` as `stage` on `worker`, recording how long it took.
    pub fn time<R>(&self, worker: usize, stage: Stage, units: usize, f: impl FnOnce() -> R) -> R {
        let started = Instant::now();
        let result = f();
        self.phase_completed(worker, stage, units, started.elapsed());
        result
    }

    /// Record a finished stage.
    pub fn phase_completed(&self, worker: usize, stage: Stage, units: usize, duration: Duration) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.timings.lock().push(PhaseTiming {
            worker,
            stage,
            units,
            duration,
        });
        self.send_update(PhaseUpdate::PhaseCompleted {
            worker,
            stage,
            units,
            duration,
        });
    }

    /// Number of stage completions recorded so far.
    pub fn completed_phases(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Time since the tracker was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Finish tracking and return timings sorted by stage, then worker.
    pub fn finish(self) -> (Duration, Vec<PhaseTiming>) {
        let duration = self.elapsed();
        self.send_update(PhaseUpdate::RunCompleted { duration });
        let mut timings = self.timings.into_inner();
        timings.sort_by_key(|t| (t.stage, t.worker));
        (duration, timings)
    }
}

impl std::fmt::Debug for PhaseTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseTracker")
            .field("completed", &self.completed_phases())
            .field("callback", &self.callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Summary statistics of a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Total wall time from spawn to join.
    pub total_duration: Duration,
    /// Number of workers.
    pub threads: usize,
    /// Whether the input was rescaled.
    pub rescaled: bool,
    /// Per-worker stage timings.
    pub timings: Vec<PhaseTiming>,
}

impl RunStats {
    /// Summed worker time spent in `stage`.
    pub fn stage_total(&self, stage: Stage) -> Duration {
        self.timings
            .iter()
            .filter(|t| t.stage == stage)
            .map(|t| t.duration)
            .sum()
    }

    /// Total units processed in `stage` across workers.
    pub fn stage_units(&self, stage: Stage) -> usize {
        self.timings
            .iter()
            .filter(|t| t.stage == stage)
            .map(|t| t.units)
            .sum()
    }
}
