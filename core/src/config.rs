//! Job configuration, loaded from a JSON file.
//!
//! Every field has a default, so `{}` is a valid config file.

use crate::{rules::DEFAULT_SETTLEMENT_WINDOW_HOURS, store::DEFAULT_COMMIT_MAX_RETRIES};
use serde::{Deserialize, Serialize};

/// Which lock the harness takes before fetching inputs.
/// At most one of the two may be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub lock_read: bool,
    #[serde(default)]
    pub lock_write: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            lock_read: true,
            lock_write: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconConfig {
    #[serde(default)]
    pub harness: HarnessConfig,
    /// Payouts due later than cutoff + this many hours stay pending.
    #[serde(default = "default_settlement_window_hours")]
    pub settlement_window_hours: i64,
    #[serde(default = "default_commit_max_retries")]
    pub commit_max_retries: u32,
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_settlement_window_hours() -> i64 {
    DEFAULT_SETTLEMENT_WINDOW_HOURS
}

fn default_commit_max_retries() -> u32 {
    DEFAULT_COMMIT_MAX_RETRIES
}

fn default_database() -> String {
    "example-payout.db".into()
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            harness: HarnessConfig::default(),
            settlement_window_hours: default_settlement_window_hours(),
            commit_max_retries: default_commit_max_retries(),
            database: default_database(),
        }
    }
}

impl ReconConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        if config.settlement_window_hours < 0 {
            anyhow::bail!("{path}: settlement_window_hours must not be negative");
        }
        Ok(config)
    }

    /// Config with hardcoded defaults for use in tests.
    pub fn default_test() -> Self {
        Self {
            database: ":memory:".into(),
            ..Self::default()
        }
    }
}
