// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-call timeouts and batching limits for the selector (§4.11).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    #[serde(with = "humantime_serde")]
    pub estimate_message_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub sign_message_timeout: Duration,
    /// Hard cap on candidates fetched per round regardless of `want`.
    pub max_candidates_per_round: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig {
            estimate_message_timeout: Duration::from_secs(10),
            sign_message_timeout: Duration::from_secs(5),
            max_candidates_per_round: 100,
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_candidates_per_round == 0 {
            anyhow::bail!("max_candidates_per_round must be positive");
        }
        Ok(())
    }
}
