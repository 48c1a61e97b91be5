use std::fmt;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info};

use rowband_bmp::BmpImage;
use rowband_core::{Coordinator, FilterKind, RowBand};

use crate::config::RunConfig;

/// Stages of a run, in order. Any error ends the run where it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loaded,
    Distributed,
    Processed,
    Assembled,
    Written,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loaded => "loaded",
            Self::Distributed => "distributed",
            Self::Processed => "processed",
            Self::Assembled => "assembled",
            Self::Written => "written",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct JobReport {
    pub phases: Vec<Phase>,
    pub bands: Vec<RowBand>,
    pub filter: FilterKind,
    pub elapsed: Duration,
}

struct Progress {
    phases: Vec<Phase>,
    started: Instant,
}

impl Progress {
    fn new() -> Self {
        Self {
            phases: vec![Phase::Idle],
            started: Instant::now(),
        }
    }

    fn enter(&mut self, phase: Phase) {
        info!(
            %phase,
            elapsed_ms = self.started.elapsed().as_millis(),
            "phase reached"
        );
        self.phases.push(phase);
    }
}

/// Load, filter across the worker pool, and write the result.
pub fn run(config: &RunConfig) -> Result<JobReport> {
    let mut progress = Progress::new();
    let coordinator = Coordinator::new(config.workers)?;
    let filter = config.mode.filter();
    info!(
        filter = %config.mode,
        workers = coordinator.worker_count(),
        input = ?config.input,
        "starting job"
    );

    let image = BmpImage::read(&config.input)
        .with_context(|| format!("load {}", config.input.display()))?;
    for (label, value) in image.summary_lines() {
        info!("{label}: {value}");
    }
    progress.enter(Phase::Loaded);

    let (headers, pixels) = image.into_parts();
    let geometry = pixels.geometry();
    let bands = coordinator.plan(geometry, filter)?;
    let items = coordinator.distribute(&pixels, &bands)?;
    drop(pixels);
    progress.enter(Phase::Distributed);

    let outputs = coordinator.process(items, filter)?;
    progress.enter(Phase::Processed);

    let assembled = coordinator.assemble(geometry, &bands, outputs)?;
    progress.enter(Phase::Assembled);

    BmpImage::from_parts(headers, assembled)?
        .write(&config.output)
        .with_context(|| format!("write {}", config.output.display()))?;
    progress.enter(Phase::Written);

    progress.enter(Phase::Done);
    debug!(bands = bands.len(), "job finished");

    Ok(JobReport {
        phases: progress.phases,
        bands,
        filter: config.mode,
        elapsed: progress.started.elapsed(),
    })
}
