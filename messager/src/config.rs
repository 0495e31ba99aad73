// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Process configuration (§4.11): a TOML file merged with `MESSAGER_*`
//! environment overrides, following the teacher's config-struct-with-
//! `Default`-and-validating-constructor idiom.

use std::path::Path;
use std::time::Duration;

use messager_headtracker::HeadTrackerConfig;
use messager_selector::SelectorConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagerConfig {
    /// `sqlx` SQLite connection string, e.g. `sqlite://messager.db`.
    pub database_url: String,
    pub selector: SelectorConfig,
    pub head_tracker: HeadTrackerConfig,
    /// Max resident entries in the [`messager_store::MessageCache`].
    pub cache_capacity: usize,
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,
    /// Warm-up window scanned for signed messages at startup (§4.2).
    #[serde(with = "humantime_serde")]
    pub cache_warmup_lookback: Duration,
    /// Per-call budget applied to node RPCs that have no more specific
    /// timeout of their own (`DefaultTimeout`, §4.10).
    #[serde(with = "humantime_serde")]
    pub default_rpc_timeout: Duration,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is
    /// unset.
    pub log_filter: String,
}

impl Default for MessagerConfig {
    fn default() -> Self {
        MessagerConfig {
            database_url: "sqlite://messager.db".to_string(),
            selector: SelectorConfig::default(),
            head_tracker: HeadTrackerConfig::default(),
            cache_capacity: 10_000,
            cache_ttl: Duration::from_secs(600),
            cache_warmup_lookback: Duration::from_secs(3600),
            default_rpc_timeout: Duration::from_secs(30),
            log_filter: "info".to_string(),
        }
    }
}

impl MessagerConfig {
    /// Loads the TOML file at `path` (if it exists; a missing file falls
    /// back to defaults), then applies `MESSAGER_DATABASE_URL` and
    /// `MESSAGER_LOG_FILTER` environment overrides, then validates.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            toml::from_str(&raw)?
        } else {
            MessagerConfig::default()
        };

        if let Ok(url) = std::env::var("MESSAGER_DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(filter) = std::env::var("MESSAGER_LOG_FILTER") {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.is_empty() {
            anyhow::bail!("database_url must not be empty");
        }
        if self.cache_capacity == 0 {
            anyhow::bail!("cache_capacity must be positive");
        }
        self.selector.validate()?;
        self.head_tracker.validate()?;
        Ok(())
    }
}
