// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Per-address nonce allocation, gas estimation and signing (§4.5), plus
//! manual/auto fee-bump replacement (§4.9).

pub mod cid_compute;
pub mod config;
pub mod driver;
pub mod error;
pub mod fee;
pub mod replace;
pub mod worker;

pub use config::SelectorConfig;
pub use driver::Selector;
pub use error::{SelectorError, SelectorResult};
pub use replace::{replace, ReplaceRequest};
pub use worker::Worker;
