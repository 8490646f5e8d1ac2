//! Replays a synthetic bar stream through one instrument pipeline and logs
//! the run report. Sizes are env-overridable: `BARFLOW_WINDOW`,
//! `BARFLOW_QUEUE_CAPACITY`, `BARFLOW_BARS`.

use std::collections::HashMap;

use barflow::{
    bounded_queue, init_logging, log_app_start, Bar, FeatureEngine, FeatureSchema, LoggingConfig,
    PipelineConfig, PipelineStage, QueueConfig,
};
use tokio::sync::watch;
use tracing::info;

/// Demo engine: reports the latest close and the window's high/low range.
struct RangeEngine;

impl FeatureEngine for RangeEngine {
    fn compute(&mut self, left: &[Bar], right: &[Bar]) -> HashMap<String, f64> {
        let bars = left.iter().chain(right.iter());
        let mut high = f64::MIN;
        let mut low = f64::MAX;
        let mut close = 0.0;
        for bar in bars {
            high = high.max(bar.high);
            low = low.min(bar.low);
            close = bar.close;
        }
        HashMap::from([
            ("close".to_string(), close),
            ("range".to_string(), high - low),
        ])
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = LoggingConfig::from_env();
    init_logging(&logging_cfg)?;
    log_app_start("replay_pipeline", &logging_cfg);

    let window_capacity = env_usize("BARFLOW_WINDOW", 16);
    let queue_capacity = env_usize("BARFLOW_QUEUE_CAPACITY", 256);
    let bar_count = env_usize("BARFLOW_BARS", 600);

    let schema = FeatureSchema::new(vec![
        "close".to_string(),
        "range".to_string(),
        "vwap".to_string(),
    ])?;

    let (bar_tx, bar_rx) = bounded_queue(&QueueConfig {
        capacity: queue_capacity,
        ..QueueConfig::default()
    })?;
    let (row_tx, mut row_rx) = bounded_queue(&QueueConfig::default())?;
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let stage = PipelineStage::new(
        schema,
        RangeEngine,
        PipelineConfig {
            window_capacity,
            default_value: 0.0,
        },
    )?;

    let producer = tokio::spawn(async move {
        for i in 0..bar_count {
            let phase = i as f64 / 20.0;
            let close = 100.0 + 5.0 * phase.sin();
            let bar = Bar {
                ts_ms_utc: 1_735_689_600_000 + (i as i64) * 1_000,
                open: close - 0.1,
                high: close + 0.2,
                low: close - 0.2,
                close,
                volume: 1.0 + phase.cos().abs(),
                is_closed: true,
            };
            if bar_tx.send(bar).await.is_err() {
                break;
            }
        }
    });

    let collector = tokio::spawn(async move {
        let mut rows = 0u64;
        let mut last = None;
        while let Some(row) = row_rx.recv().await {
            rows += 1;
            last = Some(row);
        }
        (rows, last)
    });

    let report = stage.run(bar_rx, row_tx, shutdown_rx).await?;
    producer.await?;
    let (rows_collected, last_row) = collector.await?;

    info!(
        component = "replay_pipeline",
        event = "replay.finished",
        bars_consumed = report.bars_consumed,
        rows_emitted = report.rows_emitted,
        rows_collected,
        last_row = ?last_row
    );

    Ok(())
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
