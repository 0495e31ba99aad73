// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Serialize};

const DEFAULT_SEL_MSG_NUM: u64 = 20;
const DEFAULT_GAS_OVER_ESTIMATION: f64 = 1.25;
const DEFAULT_GAS_OVER_PREMIUM: f64 = 1.0;
const DEFAULT_MAX_FEE: u128 = 7_000_000_000_000_000; // 0.007 FIL
const DEFAULT_GAS_FEE_CAP: u128 = 0;
const DEFAULT_BASE_FEE: u128 = 0;

/// Process-wide fee/selection policy. One row exists; it is replaced
/// atomically by [`crate`] consumers via `SharedParamsService::set`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SharedParams {
    pub sel_msg_num: u64,
    pub gas_over_estimation: f64,
    pub gas_over_premium: f64,
    pub max_fee: u128,
    pub gas_fee_cap: u128,
    pub base_fee: u128,
}

impl Default for SharedParams {
    fn default() -> Self {
        SharedParams {
            sel_msg_num: DEFAULT_SEL_MSG_NUM,
            gas_over_estimation: DEFAULT_GAS_OVER_ESTIMATION,
            gas_over_premium: DEFAULT_GAS_OVER_PREMIUM,
            max_fee: DEFAULT_MAX_FEE,
            gas_fee_cap: DEFAULT_GAS_FEE_CAP,
            base_fee: DEFAULT_BASE_FEE,
        }
    }
}
