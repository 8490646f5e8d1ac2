use std::collections::HashMap;
use std::time::Duration;

use barflow::{
    bounded_queue, Bar, FeatureEngine, FeatureRow, FeatureSchema, FullPolicy, PipelineConfig,
    PipelineStage, QueueConfig,
};
use tokio::sync::watch;
use tokio::time::timeout;

const START_TS_MS: i64 = 1_735_689_600_000; // 2025-01-01T00:00:00Z

fn bar(i: i64, close: f64) -> Bar {
    Bar {
        ts_ms_utc: START_TS_MS + i * 1_000,
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: 1.0,
        is_closed: true,
    }
}

fn schema(names: &[&str]) -> FeatureSchema {
    FeatureSchema::new(names.iter().map(|n| n.to_string()).collect())
        .expect("schema names are valid")
}

/// Reports a constant plus the newest close; also emits a name outside the
/// schema, which assembly must ignore. When `expect_len` is set, asserts the
/// view it receives covers exactly that many bars.
struct LastCloseEngine {
    expect_len: Option<usize>,
}

impl FeatureEngine for LastCloseEngine {
    fn compute(&mut self, left: &[Bar], right: &[Bar]) -> HashMap<String, f64> {
        if let Some(expected) = self.expect_len {
            assert_eq!(left.len() + right.len(), expected);
        }
        let newest = right.last().or_else(|| left.last()).expect("window is warm");
        HashMap::from([
            ("atr".to_string(), 2.5),
            ("vwap".to_string(), newest.close),
            ("junk".to_string(), 9.9),
        ])
    }
}

async fn drain(mut rx: barflow::QueueReceiver<FeatureRow>) -> Vec<FeatureRow> {
    let mut rows = Vec::new();
    while let Some(row) = rx.recv().await {
        rows.push(row);
    }
    rows
}

#[tokio::test]
async fn emits_rows_only_after_warmup_in_schema_order() {
    let (bar_tx, bar_rx) = bounded_queue(&QueueConfig::default()).expect("valid capacity");
    let (row_tx, row_rx) = bounded_queue(&QueueConfig::default()).expect("valid capacity");
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let stage = PipelineStage::new(
        schema(&["rsi", "atr", "vwap"]),
        LastCloseEngine { expect_len: None },
        PipelineConfig {
            window_capacity: 3,
            default_value: 0.0,
        },
    )
    .expect("valid pipeline config");

    for (i, close) in [10.0, 11.0, 12.0, 13.0, 14.0].into_iter().enumerate() {
        bar_tx
            .send(bar(i as i64, close))
            .await
            .expect("stage not started yet; queue has room");
    }
    drop(bar_tx);

    let report = stage
        .run(bar_rx, row_tx, shutdown_rx)
        .await
        .expect("pipeline runs to completion");
    let rows = drain(row_rx).await;

    assert_eq!(report.bars_consumed, 5);
    assert_eq!(report.rows_emitted, 3);
    assert_eq!(report.rows_dropped, 0);

    // First row appears at the 3rd bar, once the window is warm.
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].ts_ms_utc, START_TS_MS + 2 * 1_000);
    assert_eq!(rows[0].values, vec![0.0, 2.5, 12.0]);
    assert_eq!(rows[1].values, vec![0.0, 2.5, 13.0]);
    assert_eq!(rows[2].values, vec![0.0, 2.5, 14.0]);
}

#[tokio::test]
async fn engine_always_sees_a_full_window() {
    let (bar_tx, bar_rx) = bounded_queue(&QueueConfig::default()).expect("valid capacity");
    let (row_tx, row_rx) = bounded_queue(&QueueConfig::default()).expect("valid capacity");
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let stage = PipelineStage::new(
        schema(&["atr"]),
        LastCloseEngine { expect_len: Some(4) },
        PipelineConfig {
            window_capacity: 4,
            default_value: -1.0,
        },
    )
    .expect("valid pipeline config");

    for i in 0..10 {
        bar_tx
            .send(bar(i, 100.0 + i as f64))
            .await
            .expect("queue has room");
    }
    drop(bar_tx);

    let report = stage
        .run(bar_rx, row_tx, shutdown_rx)
        .await
        .expect("pipeline runs to completion");
    let rows = drain(row_rx).await;

    // 10 bars, warm from the 4th: 7 evaluations, each over exactly 4 bars.
    assert_eq!(report.rows_emitted, 7);
    assert_eq!(rows.len(), 7);
    for row in &rows {
        assert_eq!(row.values.len(), 1);
        assert_eq!(row.values[0], 2.5);
    }
}

#[tokio::test]
async fn shutdown_stops_the_stage_and_unblocks_the_producer() {
    let (bar_tx, bar_rx) = bounded_queue(&QueueConfig {
        capacity: 1,
        full_policy: FullPolicy::Wait,
        ..QueueConfig::default()
    })
    .expect("valid capacity");
    // Drop-on-full downstream so the stage never suspends on a slow
    // collector while we cancel it.
    let (row_tx, mut row_rx) = bounded_queue(&QueueConfig {
        capacity: 8,
        full_policy: FullPolicy::DropNewest,
        ..QueueConfig::default()
    })
    .expect("valid capacity");
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let stage = PipelineStage::new(
        schema(&["atr"]),
        LastCloseEngine { expect_len: None },
        PipelineConfig {
            window_capacity: 2,
            default_value: 0.0,
        },
    )
    .expect("valid pipeline config");

    // Producer sends until its queue is closed out from under it.
    let producer = tokio::spawn(async move {
        let mut i = 0;
        loop {
            if bar_tx.send(bar(i, 50.0)).await.is_err() {
                break;
            }
            i += 1;
        }
    });

    let stage_handle = tokio::spawn(stage.run(bar_rx, row_tx, shutdown_rx));

    // Let a few rows through, then cancel.
    timeout(Duration::from_secs(1), row_rx.recv())
        .await
        .expect("a row arrives promptly")
        .expect("row stream is open");
    shutdown_tx.send(true).expect("stage is subscribed");

    let report = timeout(Duration::from_secs(1), stage_handle)
        .await
        .expect("stage exits promptly on shutdown")
        .expect("stage task does not panic")
        .expect("pipeline stops cleanly");
    timeout(Duration::from_secs(1), producer)
        .await
        .expect("producer unblocks once the queue is closed")
        .expect("producer task does not panic");

    assert!(report.bars_consumed >= 2);
}
