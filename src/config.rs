//! Tunables for the item-management subsystem.
//!
//! Plugins `init_resource` the defaults, so a host that inserts its own
//! `InventoryConfig` (for example parsed from a RON file) wins.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid inventory config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Counter-offer size range is empty: min {min} > max {max}")]
    EmptyOfferRange { min: usize, max: usize },
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Second primary click on the same slot within this window is a double-click.
    pub double_click_window_ms: u64,
    /// Delay between counterparty items appearing in their offer pane.
    pub reveal_stagger_ms: u64,
    pub counter_offer_min: usize,
    pub counter_offer_max: usize,
    pub toast_secs: f32,
    /// Gas reported for trades that never touch the chain.
    pub estimated_swap_gas: u64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            double_click_window_ms: 300,
            reveal_stagger_ms: 250,
            counter_offer_min: 2,
            counter_offer_max: 4,
            toast_secs: 2.5,
            estimated_swap_gas: 30_000,
        }
    }
}

impl InventoryConfig {
    /// Parses a RON document. Missing fields fall back to defaults.
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        let config: InventoryConfig = ron::from_str(source)?;
        if config.counter_offer_min > config.counter_offer_max {
            return Err(ConfigError::EmptyOfferRange {
                min: config.counter_offer_min,
                max: config.counter_offer_max,
            });
        }
        Ok(config)
    }

    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_window_ms)
    }

    pub fn reveal_stagger(&self) -> Duration {
        Duration::from_millis(self.reveal_stagger_ms)
    }
}
