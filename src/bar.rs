//! Market observation domain types.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A single OHLCV price bar for one instrument.
///
/// Plain value type; `ts_ms_utc` is the bar close time in UTC milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts_ms_utc: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub is_closed: bool,
}

impl Bar {
    /// Returns the bar close time as a UTC datetime, or `None` when the
    /// millisecond timestamp is out of the representable range.
    pub fn close_time_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.ts_ms_utc).single()
    }
}

/// Dense feature vector assembled for one evaluation of the window.
///
/// `values` is laid out in schema order and always has the schema's length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub ts_ms_utc: i64,
    pub values: Vec<f64>,
}
