//! Reconciliation sweep configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Shortest sweep interval accepted; each sweep lists every customer.
pub const MIN_SWEEP_INTERVAL_SECS: u64 = 60;

/// Periodic reconciliation settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Run the in-process scheduler
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between sweeps
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl ReconciliationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs < MIN_SWEEP_INTERVAL_SECS {
            return Err(ValidationError::SweepIntervalTooShort {
                min: MIN_SWEEP_INTERVAL_SECS,
            });
        }
        Ok(())
    }
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u64 {
    3600
}
