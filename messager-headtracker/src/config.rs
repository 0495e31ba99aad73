// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::time::Duration;

use messager_core::tipset::ChainEpoch;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadTrackerConfig {
    pub head_log_path: String,
    pub look_back_limit: ChainEpoch,
    pub max_store_tipset_count: usize,
    #[serde(with = "humantime_serde")]
    pub debounce_delay: Duration,
    /// Bound on the internal apply/revert channel to StateRefresher.
    pub max_head_change_process: usize,
}

impl Default for HeadTrackerConfig {
    fn default() -> Self {
        HeadTrackerConfig {
            head_log_path: "head_log.json".to_string(),
            look_back_limit: 900,
            max_store_tipset_count: 3000,
            debounce_delay: Duration::from_secs(8),
            max_head_change_process: 5,
        }
    }
}

impl HeadTrackerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.head_log_path.is_empty() {
            anyhow::bail!("head_log_path must not be empty");
        }
        if self.look_back_limit <= 0 {
            anyhow::bail!("look_back_limit must be positive");
        }
        Ok(())
    }
}
