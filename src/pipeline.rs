//! Per-instrument consumer stage.
//!
//! Drains the bar queue one observation at a time, pushes into the rolling
//! window, and once the window is warm hands the zero-copy segment view to
//! the external feature engine, assembles its sparse result into a dense
//! vector through the prebuilt index, and forwards the row downstream.
//! Exactly one stage owns each window; fan-out happens at the queue
//! boundary, never inside the buffer.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use crate::assemble::{fill_vector_indexed, AssembleError};
use crate::bar::{Bar, FeatureRow};
use crate::queue::{QueueReceiver, QueueSender, SendOutcome};
use crate::schema::{FeatureSchema, SchemaIndex};
use crate::window::{RollingWindow, WindowError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

/// Boundary to the external feature computation.
///
/// Receives the window as two read-only slices (left then right is
/// oldest→newest); the view is valid only for the duration of the call.
/// Returns a sparse name→value mapping; names outside the schema are
/// ignored at assembly, absent names take the default value.
pub trait FeatureEngine: Send {
    fn compute(&mut self, left: &[Bar], right: &[Bar]) -> HashMap<String, f64>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Lookback length of the rolling window.
    pub window_capacity: usize,
    /// Value assembled at schema positions the engine did not report.
    pub default_value: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_capacity: 64,
            default_value: 0.0,
        }
    }
}

/// Counters for one stage run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub bars_consumed: u64,
    pub rows_emitted: u64,
    pub rows_dropped: u64,
}

pub struct PipelineStage<E: FeatureEngine> {
    window: RollingWindow<Bar>,
    schema: FeatureSchema,
    index: SchemaIndex,
    engine: E,
    scratch: Vec<f64>,
    default_value: f64,
}

impl<E: FeatureEngine> PipelineStage<E> {
    pub fn new(schema: FeatureSchema, engine: E, cfg: PipelineConfig) -> Result<Self, PipelineError> {
        let window = RollingWindow::new(cfg.window_capacity)?;
        let index = SchemaIndex::new(&schema);
        let scratch = vec![cfg.default_value; schema.len()];
        Ok(Self {
            window,
            schema,
            index,
            engine,
            scratch,
            default_value: cfg.default_value,
        })
    }

    /// Runs the stage until the bar queue closes, the downstream closes, or
    /// the shutdown signal flips.
    ///
    /// On shutdown the inbound queue is closed first so a waiting producer
    /// cannot block forever, then the stage exits without draining buffered
    /// bars.
    pub async fn run(
        mut self,
        mut bars: QueueReceiver<Bar>,
        rows: QueueSender<FeatureRow>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<PipelineReport, PipelineError> {
        info!(
            component = "pipeline",
            event = "pipeline.start",
            window_capacity = self.window.capacity(),
            feature_count = self.schema.len(),
            schema_fingerprint = self.schema.fingerprint()
        );

        let mut report = PipelineReport::default();
        let mut warmup_logged = false;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        bars.close();
                        break;
                    }
                }
                maybe_bar = bars.recv() => {
                    let Some(bar) = maybe_bar else { break };
                    report.bars_consumed += 1;
                    self.window.push(bar);

                    if !self.window.has_warmup() {
                        continue;
                    }
                    if !warmup_logged {
                        info!(
                            component = "pipeline",
                            event = "pipeline.warmup",
                            bars_consumed = report.bars_consumed
                        );
                        warmup_logged = true;
                    }

                    let (left, right) = self.window.segments();
                    let sparse = self.engine.compute(left, right);
                    fill_vector_indexed(
                        &self.schema,
                        &self.index,
                        &sparse,
                        &mut self.scratch,
                        self.default_value,
                    )?;

                    let row = FeatureRow {
                        ts_ms_utc: bar.ts_ms_utc,
                        values: self.scratch.clone(),
                    };
                    match rows.send(row).await {
                        Ok(SendOutcome::Accepted) => report.rows_emitted += 1,
                        Ok(SendOutcome::Dropped) => report.rows_dropped += 1,
                        // Downstream gone; nothing left to produce for.
                        Err(_) => {
                            bars.close();
                            break;
                        }
                    }
                }
            }
        }

        info!(
            component = "pipeline",
            event = "pipeline.stop",
            bars_consumed = report.bars_consumed,
            rows_emitted = report.rows_emitted,
            rows_dropped = report.rows_dropped
        );
        Ok(report)
    }
}
