// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Fee-override precedence: per-message `meta` beats the address's own
//! override, which beats the process-wide [`SharedParams`] default (§4.5
//! step 7).

use messager_core::address_info::FeeParams;
use messager_core::message::MsgMeta;
use messager_core::shared_params::SharedParams;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedFee {
    pub gas_over_estimation: f64,
    pub gas_over_premium: f64,
    pub max_fee: u128,
    pub gas_fee_cap: u128,
    pub base_fee: Option<u128>,
}

pub fn resolve(meta: Option<&MsgMeta>, addr_fee: &FeeParams, shared: &SharedParams) -> ResolvedFee {
    macro_rules! pick {
        ($field:ident) => {
            meta.and_then(|m| m.$field)
                .or(addr_fee.$field)
                .unwrap_or(shared.$field)
        };
    }
    ResolvedFee {
        gas_over_estimation: pick!(gas_over_estimation),
        gas_over_premium: pick!(gas_over_premium),
        max_fee: pick!(max_fee),
        gas_fee_cap: pick!(gas_fee_cap),
        base_fee: meta.and_then(|m| m.base_fee),
    }
}

/// A candidate whose `meta.base_fee` floor has not been met by the tipset's
/// actual parent base fee is deferred, not failed (§4.5 step 7).
pub fn is_deferred(meta: Option<&MsgMeta>, parent_base_fee: u128) -> bool {
    meta.and_then(|m| m.base_fee).is_some_and(|floor| floor < parent_base_fee)
}
