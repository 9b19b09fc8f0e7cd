//! Barrier-synchronized multi-phase contour pipeline.
//!
//! A fixed pool of workers runs the same phase sequence over disjoint row
//! ranges. A single reusable barrier separates the phases:
//!
//! 1. rescale (only for oversized input), barrier, release of the original
//!    buffer by worker 0, barrier
//! 2. interior sampling, right edge sampling, bottom edge sampling (worker 0)
//! 3. barrier
//! 4. stamping
//!
//! Stamping reads grid rows one past the worker's own range, which is why
//! the barrier before it is required. Writes within a phase never overlap
//! between workers, so no lock guards the grid or the output image.

use crate::core::config::PipelineConfig;
use crate::core::error::{PipelineError, PipelineResult};
use crate::core::grid::OccupancyGrid;
use crate::core::patterns::ContourPatterns;
use crate::core::stage::Stage;
use crate::core::types::{Dimensions, PixelBuffer, PixelView, Rgb};
use crate::execution::partition::partition;
use crate::execution::progress::{PhaseCallback, PhaseTracker, PhaseUpdate, RunStats};
use crate::execution::resample::resample_rows;
use crate::execution::sampling::GridSampler;
use crate::execution::shared::{DisjointSlice, SharedGrid};
use crate::execution::stamp::{configuration_with, stamp_rows};
use log::{debug, error, info, trace};
use parking_lot::RwLock;
use std::cell::Cell;
use std::sync::{Arc, Barrier};

/// Ownership state of the input buffer when rescaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The original buffer is alive and being resampled.
    PreRescale,
    /// The original buffer has been released; the rescaled one is current.
    PostRescale,
}

/// Single owning slot for the original image during a rescaling run.
///
/// Workers read the original concurrently during the rescale phase. Worker 0
/// then performs the `PreRescale -> PostRescale` transition, which drops the
/// original buffer, between two barriers.
#[derive(Debug)]
pub struct ImageSlot {
    original: RwLock<Option<PixelBuffer>>,
    dimensions: Dimensions,
}

impl ImageSlot {
    /// Take ownership of the original image.
    pub fn new(original: PixelBuffer) -> Self {
        let dimensions = original.dimensions();
        Self {
            original: RwLock::new(Some(original)),
            dimensions,
        }
    }

    /// Current ownership phase.
    pub fn phase(&self) -> Phase {
        if self.original.read().is_some() {
            Phase::PreRescale
        } else {
            Phase::PostRescale
        }
    }

    /// Dimensions of the original image, still known after release.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Run `f` on the original image while it is alive.
    pub fn with_original<R>(&self, f: impl FnOnce(&PixelBuffer) -> R) -> Option<R> {
        self.original.read().as_ref().map(f)
    }

    /// Release the original buffer. Returns the phase before the call.
    pub fn release(&self) -> Phase {
        match self.original.write().take() {
            Some(_) => Phase::PreRescale,
            None => Phase::PostRescale,
        }
    }
}

/// Aborts the process if a worker unwinds. Peers blocked at the barrier
/// would otherwise wait forever.
struct AbortOnPanic {
    worker: usize,
    stage: Cell<Stage>,
}

impl AbortOnPanic {
    fn new(worker: usize) -> Self {
        Self {
            worker,
            stage: Cell::new(Stage::Spawn),
        }
    }

    fn enter(&self, stage: Stage) {
        self.stage.set(stage);
    }
}

impl Drop for AbortOnPanic {
    fn drop(&mut self) {
        if std::thread::panicking() {
            abort_run(&fault_diagnostic(self.worker, self.stage.get(), "panicked"));
        }
    }
}

/// Message reported before a run is aborted.
fn fault_diagnostic(worker: usize, stage: Stage, what: &str) -> String {
    format!("worker {worker} {what} during {stage}; aborting run")
}

/// Report `message` and abort. The message also goes to stderr so it is
/// visible when no logger is installed.
fn abort_run(message: &str) -> ! {
    error!("{message}");
    eprintln!("isomarch: {message}");
    std::process::abort()
}

/// Per-worker view of the shared run state.
struct WorkerContext<'a> {
    thread_id: usize,
    thread_count: usize,
    slot: Option<&'a ImageSlot>,
    canvas: &'a DisjointSlice<'a, Rgb>,
    canvas_dims: Dimensions,
    grid: &'a SharedGrid,
    patterns: &'a ContourPatterns,
    barrier: &'a Barrier,
    sampler: GridSampler,
    tracker: &'a PhaseTracker,
}

impl WorkerContext<'_> {
    /// Whether this worker executes `stage`. Solo stages belong to worker 0.
    fn runs(&self, stage: Stage) -> bool {
        !stage.is_solo() || self.thread_id == 0
    }

    fn run(&self) {
        let guard = AbortOnPanic::new(self.thread_id);
        let id = self.thread_id;
        let Dimensions { width, height } = self.canvas_dims;

        if let Some(slot) = self.slot {
            guard.enter(Stage::Rescale);
            let rows = partition(id, self.thread_count, height);
            debug!("worker {id}: rescale rows {rows:?}");
            self.tracker.time(id, Stage::Rescale, rows.len(), || {
                slot.with_original(|source| {
                    resample_rows(source, width, height, rows.clone(), |r, line| {
                        // SAFETY: row `r` lies in this worker's partition of the target.
                        unsafe { self.canvas.write_slice(r * width, line) }
                    })
                })
            });
            self.barrier.wait();

            if self.runs(Stage::Release) {
                guard.enter(Stage::Release);
                let before = slot.release();
                trace!("worker 0: released original buffer ({before:?} -> {:?})", slot.phase());
                self.tracker.send_update(PhaseUpdate::Rescaled {
                    from: slot.dimensions(),
                    to: self.canvas_dims,
                });
            }
            self.barrier.wait();
        }

        let cell_rows = self.sampler.cell_rows(height);
        let rows = partition(id, self.thread_count, cell_rows);
        let set = |i: usize, j: usize, bit: u8| self.grid.set(i, j, bit);

        {
            // SAFETY: nobody writes the canvas between the rescale barrier
            // and the stamping barrier.
            let view = PixelView::from_parts(width, height, unsafe { self.canvas.as_slice() });

            guard.enter(Stage::SampleInterior);
            debug!("worker {id}: sample rows {rows:?}");
            self.tracker.time(id, Stage::SampleInterior, rows.len(), || {
                self.sampler.sample_interior(&view, rows.clone(), set)
            });

            guard.enter(Stage::SampleRightEdge);
            self.tracker.time(id, Stage::SampleRightEdge, rows.len(), || {
                self.sampler.sample_right_edge(&view, rows.clone(), set)
            });

            if self.runs(Stage::SampleBottomEdge) {
                guard.enter(Stage::SampleBottomEdge);
                trace!("worker 0: sampling bottom edge row {cell_rows}");
                self.tracker.time(id, Stage::SampleBottomEdge, 1, || {
                    self.sampler.sample_bottom_edge(&view, set)
                });
            }
        }

        self.barrier.wait();

        guard.enter(Stage::Stamp);
        debug!("worker {id}: stamp rows {rows:?}");
        let (step_x, step_y) = (self.sampler.step_x, self.sampler.step_y);
        let cell_cols = self.sampler.cell_cols(width);
        self.tracker.time(id, Stage::Stamp, rows.len(), || {
            for i in rows.clone() {
                for j in 0..cell_cols {
                    let k = configuration_with(|r, c| self.grid.get(r, c), i, j);
                    let pattern = self.patterns.get(k);
                    stamp_rows(width, height, pattern, j * step_x, i * step_y, |offset, row| {
                        // SAFETY: pixel rows of cell row `i` belong to this worker.
                        unsafe { self.canvas.write_slice(offset, row) }
                    });
                }
            }
        });
    }
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct RunOutput {
    /// Final contour image, rescaled if rescaling happened.
    pub image: PixelBuffer,
    /// Occupancy grid the image was stamped from.
    pub grid: OccupancyGrid,
    /// Timing and bookkeeping.
    pub stats: RunStats,
}

/// Owns the worker pool configuration and drives every run.
pub struct PhaseOrchestrator {
    config: PipelineConfig,
    threads: usize,
    callback: Option<Arc<PhaseCallback>>,
}

impl std::fmt::Debug for PhaseOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseOrchestrator")
            .field("config", &self.config)
            .field("threads", &self.threads)
            .field("callback", &self.callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl PhaseOrchestrator {
    /// Create an orchestrator for `threads` workers.
    pub fn new(config: PipelineConfig, threads: usize) -> PipelineResult<Self> {
        if threads == 0 {
            return Err(PipelineError::InvalidThreadCount(threads));
        }
        config.validate()?;
        Ok(Self {
            config,
            threads,
            callback: None,
        })
    }

    /// Set a progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PhaseUpdate) + Send + Sync + 'static,
    {
        let callback: PhaseCallback = Box::new(callback);
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Configuration used for every run.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of workers.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run the pipeline and return only the final image.
    pub fn run_image(
        &self,
        image: PixelBuffer,
        patterns: &ContourPatterns,
    ) -> PipelineResult<PixelBuffer> {
        self.run(image, patterns).map(|output| output.image)
    }

    /// Run the full pipeline on `image`, consuming it.
    pub fn run(&self, image: PixelBuffer, patterns: &ContourPatterns) -> PipelineResult<RunOutput> {
        let config = &self.config;
        patterns.ensure_cell_size(config.cell_size())?;

        let input = image.dimensions();
        if input.area() == 0 {
            return Err(PipelineError::EmptyImage(input));
        }

        let rescaled = config.needs_rescale(input.width, input.height);
        let working = config.working_dimensions(input.width, input.height);
        let (slot, mut canvas) = if rescaled {
            let canvas = PixelBuffer::try_new(working.width, working.height)?;
            (Some(ImageSlot::new(image)), canvas)
        } else {
            (None, image)
        };
        let mut grid = OccupancyGrid::for_image(working, config.step_x, config.step_y)?;
        let shared_grid = SharedGrid::shaped_like(&grid)?;

        info!(
            "contouring {input} (working size {working}) with {} threads, rescale: {rescaled}",
            self.threads
        );

        let tracker = PhaseTracker::new(self.callback.clone());
        tracker.send_update(PhaseUpdate::RunStarted {
            input,
            working,
            threads: self.threads,
        });

        {
            let canvas_view = DisjointSlice::new(canvas.pixels_mut());
            let barrier = Barrier::new(self.threads);
            let sampler = GridSampler::new(config.step_x, config.step_y, config.sigma);

            let contexts: Vec<WorkerContext<'_>> = (0..self.threads)
                .map(|thread_id| WorkerContext {
                    thread_id,
                    thread_count: self.threads,
                    slot: slot.as_ref(),
                    canvas: &canvas_view,
                    canvas_dims: working,
                    grid: &shared_grid,
                    patterns,
                    barrier: &barrier,
                    sampler,
                    tracker: &tracker,
                })
                .collect();

            spawn_and_join(&contexts)?;
        }

        shared_grid.store_into(&mut grid);

        let phases = tracker.completed_phases();
        let (total_duration, timings) = tracker.finish();
        info!("contouring finished in {total_duration:?} ({phases} worker phases)");

        Ok(RunOutput {
            image: canvas,
            grid,
            stats: RunStats {
                total_duration,
                threads: self.threads,
                rescaled,
                timings,
            },
        })
    }
}

fn spawn_and_join(contexts: &[WorkerContext<'_>]) -> PipelineResult<()> {
    let scoped = crossbeam::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(contexts.len());
        for ctx in contexts {
            let spawned = scope
                .builder()
                .name(format!("isomarch-worker-{}", ctx.thread_id))
                .spawn(move |_| ctx.run());
            match spawned {
                Ok(handle) => handles.push((ctx.thread_id, handle)),
                Err(e) if handles.is_empty() => {
                    return Err(PipelineError::ConcurrencyFault {
                        stage: Stage::Spawn,
                        worker: ctx.thread_id,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    // Workers already started are waiting on a barrier sized
                    // for the full pool.
                    let what = format!("failed to start ({e})");
                    abort_run(&fault_diagnostic(ctx.thread_id, Stage::Spawn, &what));
                }
            }
        }

        for (worker, handle) in handles {
            handle.join().map_err(|_| PipelineError::ConcurrencyFault {
                stage: Stage::Join,
                worker,
                reason: "worker panicked".to_string(),
            })?;
        }
        Ok(())
    });

    scoped.unwrap_or_else(|_| {
        Err(PipelineError::ConcurrencyFault {
            stage: Stage::Join,
            worker: 0,
            reason: "worker scope panicked".to_string(),
        })
    })
}

/// Run the pipeline with `thread_count` workers and return the final image.
pub fn run(
    image: PixelBuffer,
    patterns: &ContourPatterns,
    thread_count: usize,
    config: PipelineConfig,
) -> PipelineResult<PixelBuffer> {
    PhaseOrchestrator::new(config, thread_count)?.run_image(image, patterns)
}
