// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::Address;
use crate::cid::{MsgCid, TipsetKey};

/// The unsigned transaction embedded in every [`Message`] row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnsignedMessage {
    pub from: Address,
    pub to: Address,
    pub nonce: u64,
    pub value: u128,
    pub gas_limit: i64,
    pub gas_fee_cap: u128,
    pub gas_premium: u128,
    pub method: u64,
    #[serde(default)]
    pub params: Vec<u8>,
}

/// A Secp256k1/BLS signature over an unsigned message's CID.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub sig_type: SignatureType,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureType {
    Secp256k1,
    Bls,
    Delegated,
}

/// The on-chain execution result, once the message is included in a tipset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub exit_code: i64,
    #[serde(default)]
    pub return_value: Vec<u8>,
    pub gas_used: i64,
}

/// Per-send fee overrides, supplied by the caller at push time. Takes
/// precedence over the address's overrides, which take precedence over
/// [`crate::shared_params::SharedParams`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MsgMeta {
    pub gas_over_estimation: Option<f64>,
    pub gas_over_premium: Option<f64>,
    pub max_fee: Option<u128>,
    pub gas_fee_cap: Option<u128>,
    pub base_fee: Option<u128>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageState {
    UnFillMsg,
    FillMsg,
    OnChainMsg,
    FailedMsg,
    NoWalletMsg,
    ReplacedMsg,
}

impl MessageState {
    /// Matches the spec's `state ≥ FillMsg` shorthand used in the nonce and
    /// signature invariants: anything that has left the UnFill state has
    /// been assigned a nonce and signed at least once.
    pub fn is_at_least_filled(self) -> bool {
        !matches!(self, MessageState::UnFillMsg)
    }
}

/// One unit of work moving through the signing and submission pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub unsigned: UnsignedMessage,
    pub signature: Option<Signature>,
    pub unsigned_cid: Option<MsgCid>,
    pub signed_cid: Option<MsgCid>,
    pub height: i64,
    pub tipset_key: Option<TipsetKey>,
    pub receipt: Option<Receipt>,
    pub state: MessageState,
    pub meta: Option<MsgMeta>,
    pub from_user: Option<String>,
    pub wallet_name: Option<String>,
    pub error_msg: Option<String>,
    /// Count of consecutive gas-estimation failures for this row, exposed
    /// for observation per the open question in SPEC_FULL.md §9; never
    /// consulted to change selection behavior.
    pub estimate_failures: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    pub fn new_unfilled(id: Uuid, unsigned: UnsignedMessage, meta: Option<MsgMeta>) -> Self {
        let now = Utc::now();
        Message {
            id,
            unsigned,
            signature: None,
            unsigned_cid: None,
            signed_cid: None,
            height: 0,
            tipset_key: None,
            receipt: None,
            state: MessageState::UnFillMsg,
            meta,
            from_user: None,
            wallet_name: None,
            error_msg: None,
            estimate_failures: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from(&self) -> &Address {
        &self.unsigned.from
    }

    pub fn nonce(&self) -> u64 {
        self.unsigned.nonce
    }
}
