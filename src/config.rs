//! Atomically-swapped decision configuration.
//!
//! Readers on the hot path take a single atomic load and see one
//! fully-formed snapshot; the writer replaces the whole snapshot when the
//! configuration source changes and notifies subscribers through a watch
//! channel. No partial in-place mutation of shared config.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

/// Compact, frequently-read decision parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionConfig {
    pub threshold_long: f64,
    pub threshold_short: f64,
    pub min_risk_reward: f64,
    pub max_cost_ratio: f64,
    pub risk_fraction_per_trade: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            threshold_long: 0.60,
            threshold_short: 0.58,
            min_risk_reward: 1.5,
            max_cost_ratio: 0.15,
            risk_fraction_per_trade: 0.0075,
        }
    }
}

/// Raw, partially-specified configuration as delivered by an external
/// loader. Missing fields resolve to documented defaults at snapshot
/// construction, never at read time.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DecisionSettings {
    pub threshold_long: Option<f64>,
    pub threshold_short: Option<f64>,
    pub min_risk_reward: Option<f64>,
    pub max_cost_ratio: Option<f64>,
    pub risk_fraction_per_trade: Option<f64>,
}

impl DecisionSettings {
    /// Resolves to a complete snapshot, filling absent fields with defaults.
    pub fn resolve(&self) -> DecisionConfig {
        let defaults = DecisionConfig::default();
        DecisionConfig {
            threshold_long: self.threshold_long.unwrap_or(defaults.threshold_long),
            threshold_short: self.threshold_short.unwrap_or(defaults.threshold_short),
            min_risk_reward: self.min_risk_reward.unwrap_or(defaults.min_risk_reward),
            max_cost_ratio: self.max_cost_ratio.unwrap_or(defaults.max_cost_ratio),
            risk_fraction_per_trade: self
                .risk_fraction_per_trade
                .unwrap_or(defaults.risk_fraction_per_trade),
        }
    }
}

/// Holds the latest decision snapshot for lock-free reads.
///
/// The one structure in this crate intentionally shared across threads: many
/// readers, a single infrequent writer path.
#[derive(Debug)]
pub struct DecisionConfigProvider {
    current: ArcSwap<DecisionConfig>,
    generation_tx: watch::Sender<u64>,
}

impl DecisionConfigProvider {
    pub fn new(settings: &DecisionSettings) -> Self {
        let (generation_tx, _) = watch::channel(0);
        Self {
            current: ArcSwap::from_pointee(settings.resolve()),
            generation_tx,
        }
    }

    /// Latest snapshot (single atomic load).
    pub fn current(&self) -> Arc<DecisionConfig> {
        self.current.load_full()
    }

    /// Replaces the whole snapshot and notifies subscribers.
    pub fn update(&self, settings: &DecisionSettings) {
        let resolved = settings.resolve();
        self.current.store(Arc::new(resolved));
        self.generation_tx.send_modify(|generation| *generation += 1);
        info!(
            component = "config",
            event = "config.updated",
            threshold_long = resolved.threshold_long,
            threshold_short = resolved.threshold_short,
            min_risk_reward = resolved.min_risk_reward,
            max_cost_ratio = resolved.max_cost_ratio,
            risk_fraction_per_trade = resolved.risk_fraction_per_trade
        );
    }

    /// Change-notification channel: the value is a generation counter bumped
    /// on every update.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation_tx.subscribe()
    }
}

impl Default for DecisionConfigProvider {
    fn default() -> Self {
        Self::new(&DecisionSettings::default())
    }
}
