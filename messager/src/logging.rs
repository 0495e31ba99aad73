// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! `tracing-subscriber` setup (§4.11): an `EnvFilter` plus `fmt` layer,
//! respecting `RUST_LOG` when set and falling back to the config's
//! `log_filter` directive otherwise.

use tracing_subscriber::EnvFilter;

pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
