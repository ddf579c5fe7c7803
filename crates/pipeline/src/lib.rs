//! Tick-driven inference pipeline.
//!
//! One pipeline instance orchestrates Frame -> Resampler -> TensorBuilder ->
//! InferenceAdapter -> Decoder on a fixed cadence, with at most one inference
//! in flight. The state machine is explicit:
//!
//! - `Idle`: waiting for the next tick
//! - `Capturing`: frame acquired, preprocessing in progress
//! - `Inferring`: tensor handed to the adapter, awaiting decode
//! - `Halted`: a configuration fault occurred; further ticks are no-ops
//!
//! Ticks that arrive while the pipeline is not idle are dropped, never
//! queued. All tensors are scoped to a single [`Pipeline::tick`] call and
//! released on every exit path; the only state crossing cycle boundaries is
//! the detection analyzer's retained last frame.

pub mod analyzers;
pub mod config;

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use visage_common::{FrameError, FrameSource};
use visage_emotion::EmotionError;
use visage_face::FaceError;

pub use analyzers::{Analysis, Analyzer, EmotionAnalyzer, FaceAnalyzer, FaceReport};
pub use config::PipelineConfig;

/// Errors that halt the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Frame capture fault: {0}")]
    Frame(#[from] FrameError),

    #[error("Emotion classification fault: {0}")]
    Emotion(#[from] EmotionError),

    #[error("Face detection fault: {0}")]
    Face(#[from] FaceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Pipeline lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No inference in flight
    Idle,
    /// Frame acquired, preprocessing in progress
    Capturing,
    /// Tensor handed to the inference adapter
    Inferring,
    /// Fatal fault; the pipeline will not run again
    Halted,
}

/// What one tick did
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// A full cycle ran and published a result
    Completed(Analysis),
    /// No frame available yet; still idle, will retry next tick
    NoFrame,
    /// Tick arrived while a cycle was in flight; dropped, not queued
    Dropped,
    /// Pipeline is halted; tick was a no-op
    Halted,
}

/// Consumer of published analyses (the UI collaborator seam)
pub trait ResultSink {
    fn publish(&mut self, analysis: &Analysis);
}

/// Collecting sink, convenient in tests and demos
impl ResultSink for Vec<Analysis> {
    fn publish(&mut self, analysis: &Analysis) {
        self.push(analysis.clone());
    }
}

/// The tick-driven pipeline state machine
pub struct Pipeline {
    source: Box<dyn FrameSource>,
    analyzer: Box<dyn Analyzer>,
    sink: Box<dyn ResultSink>,
    state: PipelineState,
    dropped_ticks: u64,
    fault: Option<String>,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        source: Box<dyn FrameSource>,
        analyzer: Box<dyn Analyzer>,
        sink: Box<dyn ResultSink>,
    ) -> Self {
        Self {
            source,
            analyzer,
            sink,
            state: PipelineState::Idle,
            dropped_ticks: 0,
            fault: None,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Number of ticks dropped because a cycle was already in flight
    #[must_use]
    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks
    }

    /// Diagnostic of the fault that halted the pipeline, if any
    #[must_use]
    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    /// Advance the pipeline by one timer tick.
    ///
    /// On `Idle` this runs a full synchronous cycle; all other states make
    /// the tick a no-op. A fault latches the `Halted` state so a stale or
    /// zeroed result can never be published after a configuration error.
    pub fn tick(&mut self) -> TickOutcome {
        match self.state {
            PipelineState::Halted => TickOutcome::Halted,
            PipelineState::Capturing | PipelineState::Inferring => {
                self.dropped_ticks += 1;
                debug!(
                    "Dropping tick: cycle in flight ({} dropped so far)",
                    self.dropped_ticks
                );
                TickOutcome::Dropped
            }
            PipelineState::Idle => match self.run_cycle() {
                Ok(Some(analysis)) => TickOutcome::Completed(analysis),
                Ok(None) => TickOutcome::NoFrame,
                Err(e) => {
                    error!("Pipeline halted: {e}");
                    self.fault = Some(e.to_string());
                    self.state = PipelineState::Halted;
                    TickOutcome::Halted
                }
            },
        }
    }

    /// One full cycle: capture, preprocess, infer, decode, publish.
    ///
    /// Every tensor allocated here dies when this call returns, on the
    /// success path and the fault path alike.
    fn run_cycle(&mut self) -> Result<Option<Analysis>, PipelineError> {
        self.state = PipelineState::Capturing;

        let frame = match self.source.next_frame()? {
            Some(frame) => frame,
            None => {
                debug!("No frame available yet; staying idle");
                self.state = PipelineState::Idle;
                return Ok(None);
            }
        };

        self.state = PipelineState::Inferring;
        let analysis = self.analyzer.analyze(&frame)?;

        self.sink.publish(&analysis);
        self.state = PipelineState::Idle;
        Ok(Some(analysis))
    }

    /// Drive the pipeline from a timer until it halts or shutdown is
    /// requested.
    ///
    /// Uses a skipping interval: ticks that would pile up behind a slow
    /// cycle are discarded by the timer itself, preserving the
    /// at-most-one-in-flight invariant even if cycles run long.
    pub async fn run(&mut self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Pipeline running with a {:?} tick period", period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let TickOutcome::Halted = self.tick() {
                        warn!("Pipeline halted; stopping timer loop");
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Pipeline shutdown requested");
                        break;
                    }
                }
            }
        }
    }
}
