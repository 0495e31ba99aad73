// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressState {
    Alive,
    Forbidden,
    Removed,
}

/// Per-address fee overrides. Any field left `None` falls through to
/// [`crate::shared_params::SharedParams`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeParams {
    pub gas_over_estimation: Option<f64>,
    pub gas_over_premium: Option<f64>,
    pub max_fee: Option<u128>,
    pub gas_fee_cap: Option<u128>,
    pub base_fee: Option<u128>,
}

/// A managed source account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub addr: Address,
    /// Next unassigned nonce; monotone non-decreasing.
    pub nonce: u64,
    pub state: AddressState,
    /// Per-round selection cap; 0 means "use the global default".
    pub sel_msg_num: u64,
    pub fee_params: FeeParams,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AddressInfo {
    pub fn new(addr: Address) -> Self {
        let now = Utc::now();
        AddressInfo {
            addr,
            nonce: 0,
            state: AddressState::Alive,
            sel_msg_num: 0,
            fee_params: FeeParams::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, AddressState::Alive)
    }
}

/// An optional secondary chain endpoint used for broadcast fan-out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub url: String,
    pub token: Option<String>,
}
