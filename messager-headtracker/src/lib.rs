// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Reconciles the chain node's head-change stream against the persisted
//! message pipeline (§4.7-4.8): ancestor-gap-walking reorg resolution, a
//! debounced trigger to the Selector, and the StateRefresher that applies
//! observed receipts back onto message rows.

pub mod config;
pub mod error;
pub mod gap;
pub mod headlog;
pub mod staterefresher;
pub mod tracker;

pub use config::HeadTrackerConfig;
pub use error::{HeadTrackerError, HeadTrackerResult};
pub use gap::GapResolution;
pub use headlog::HeadLog;
pub use staterefresher::StateRefresher;
pub use tracker::{HeadTracker, ResolvedHeadChange};
