// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! SQL row shapes and the conversions to/from `messager_core` domain types.
//! Kept separate from the query modules so the "what a row looks like on
//! disk" concern doesn't bleed into "how we query it".

use chrono::{DateTime, Utc};
use messager_core::address::Address;
use messager_core::address_info::{AddressInfo, AddressState, FeeParams};
use messager_core::cid::{MsgCid, TipsetKey};
use messager_core::message::{
    Message, MessageState, MsgMeta, Receipt, Signature, SignatureType, UnsignedMessage,
};
use messager_core::shared_params::SharedParams;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

#[derive(sqlx::FromRow)]
pub struct MessageRow {
    pub id: String,
    pub from_addr: String,
    pub to_addr: String,
    pub nonce: i64,
    pub value: String,
    pub gas_limit: i64,
    pub gas_fee_cap: String,
    pub gas_premium: String,
    pub method: i64,
    pub params: Option<Vec<u8>>,
    pub signature_type: Option<String>,
    pub signature_bytes: Option<Vec<u8>>,
    pub unsigned_cid: Option<String>,
    pub signed_cid: Option<String>,
    pub height: i64,
    pub tipset_key: Option<String>,
    pub exit_code: Option<i64>,
    pub return_value: Option<Vec<u8>>,
    pub gas_used: Option<i64>,
    pub state: String,
    pub meta: Option<String>,
    pub from_user: Option<String>,
    pub wallet_name: Option<String>,
    pub error_msg: Option<String>,
    pub estimate_failures: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn state_to_str(state: MessageState) -> &'static str {
    match state {
        MessageState::UnFillMsg => "UnFillMsg",
        MessageState::FillMsg => "FillMsg",
        MessageState::OnChainMsg => "OnChainMsg",
        MessageState::FailedMsg => "FailedMsg",
        MessageState::NoWalletMsg => "NoWalletMsg",
        MessageState::ReplacedMsg => "ReplacedMsg",
    }
}

fn str_to_state(s: &str) -> StoreResult<MessageState> {
    Ok(match s {
        "UnFillMsg" => MessageState::UnFillMsg,
        "FillMsg" => MessageState::FillMsg,
        "OnChainMsg" => MessageState::OnChainMsg,
        "FailedMsg" => MessageState::FailedMsg,
        "NoWalletMsg" => MessageState::NoWalletMsg,
        "ReplacedMsg" => MessageState::ReplacedMsg,
        other => return Err(StoreError::Decode(format!("unknown message state {other}"))),
    })
}

fn tipset_key_to_str(key: &TipsetKey) -> String {
    key.cids().iter().map(|c| c.as_str()).collect::<Vec<_>>().join(",")
}

fn str_to_tipset_key(s: &str) -> TipsetKey {
    TipsetKey::new(s.split(',').filter(|p| !p.is_empty()).map(MsgCid::new).collect())
}

impl MessageRow {
    pub fn into_message(self) -> StoreResult<Message> {
        let signature = match (self.signature_type, self.signature_bytes) {
            (Some(t), Some(bytes)) => Some(Signature {
                sig_type: match t.as_str() {
                    "Secp256k1" => SignatureType::Secp256k1,
                    "Bls" => SignatureType::Bls,
                    "Delegated" => SignatureType::Delegated,
                    other => return Err(StoreError::Decode(format!("unknown signature type {other}"))),
                },
                bytes,
            }),
            _ => None,
        };
        let receipt = match (self.exit_code, self.gas_used) {
            (Some(exit_code), Some(gas_used)) => Some(Receipt {
                exit_code,
                return_value: self.return_value.unwrap_or_default(),
                gas_used,
            }),
            _ => None,
        };
        let meta = self
            .meta
            .as_deref()
            .map(serde_json::from_str::<MsgMeta>)
            .transpose()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(Message {
            id: Uuid::parse_str(&self.id).map_err(|e| StoreError::Decode(e.to_string()))?,
            unsigned: UnsignedMessage {
                from: Address::new(self.from_addr),
                to: Address::new(self.to_addr),
                nonce: self.nonce as u64,
                value: self.value.parse().map_err(|_| StoreError::Decode("value".into()))?,
                gas_limit: self.gas_limit,
                gas_fee_cap: self
                    .gas_fee_cap
                    .parse()
                    .map_err(|_| StoreError::Decode("gas_fee_cap".into()))?,
                gas_premium: self
                    .gas_premium
                    .parse()
                    .map_err(|_| StoreError::Decode("gas_premium".into()))?,
                method: self.method as u64,
                params: self.params.unwrap_or_default(),
            },
            signature,
            unsigned_cid: self.unsigned_cid.map(MsgCid::new),
            signed_cid: self.signed_cid.map(MsgCid::new),
            height: self.height,
            tipset_key: self.tipset_key.as_deref().map(str_to_tipset_key),
            receipt,
            state: str_to_state(&self.state)?,
            meta,
            from_user: self.from_user,
            wallet_name: self.wallet_name,
            error_msg: self.error_msg,
            estimate_failures: self.estimate_failures.max(0) as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct MessageFields<'a> {
    pub id: String,
    pub from_addr: &'a str,
    pub to_addr: &'a str,
    pub nonce: i64,
    pub value: String,
    pub gas_limit: i64,
    pub gas_fee_cap: String,
    pub gas_premium: String,
    pub method: i64,
    pub params: &'a [u8],
    pub signature_type: Option<&'static str>,
    pub signature_bytes: Option<&'a [u8]>,
    pub unsigned_cid: Option<&'a str>,
    pub signed_cid: Option<&'a str>,
    pub height: i64,
    pub tipset_key: Option<String>,
    pub exit_code: Option<i64>,
    pub return_value: Option<&'a [u8]>,
    pub gas_used: Option<i64>,
    pub state: &'static str,
    pub meta: Option<String>,
    pub from_user: Option<&'a str>,
    pub wallet_name: Option<&'a str>,
    pub error_msg: Option<&'a str>,
    pub estimate_failures: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> MessageFields<'a> {
    pub fn from_message(m: &'a Message) -> StoreResult<Self> {
        let (signature_type, signature_bytes) = match &m.signature {
            Some(sig) => (
                Some(match sig.sig_type {
                    SignatureType::Secp256k1 => "Secp256k1",
                    SignatureType::Bls => "Bls",
                    SignatureType::Delegated => "Delegated",
                }),
                Some(sig.bytes.as_slice()),
            ),
            None => (None, None),
        };
        let (exit_code, return_value, gas_used) = match &m.receipt {
            Some(r) => (Some(r.exit_code), Some(r.return_value.as_slice()), Some(r.gas_used)),
            None => (None, None, None),
        };
        let meta = m
            .meta
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(MessageFields {
            id: m.id.to_string(),
            from_addr: m.unsigned.from.as_str(),
            to_addr: m.unsigned.to.as_str(),
            nonce: m.unsigned.nonce as i64,
            value: m.unsigned.value.to_string(),
            gas_limit: m.unsigned.gas_limit,
            gas_fee_cap: m.unsigned.gas_fee_cap.to_string(),
            gas_premium: m.unsigned.gas_premium.to_string(),
            method: m.unsigned.method as i64,
            params: &m.unsigned.params,
            signature_type,
            signature_bytes,
            unsigned_cid: m.unsigned_cid.as_ref().map(MsgCid::as_str),
            signed_cid: m.signed_cid.as_ref().map(MsgCid::as_str),
            height: m.height,
            tipset_key: m.tipset_key.as_ref().map(tipset_key_to_str),
            exit_code,
            return_value,
            gas_used,
            state: state_to_str(m.state),
            meta,
            from_user: m.from_user.as_deref(),
            wallet_name: m.wallet_name.as_deref(),
            error_msg: m.error_msg.as_deref(),
            estimate_failures: m.estimate_failures as i64,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct AddressRow {
    pub addr: String,
    pub nonce: i64,
    pub state: String,
    pub sel_msg_num: i64,
    pub gas_over_estimation: Option<f64>,
    pub gas_over_premium: Option<f64>,
    pub max_fee: Option<String>,
    pub gas_fee_cap: Option<String>,
    pub base_fee: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AddressRow {
    pub fn into_address_info(self) -> StoreResult<AddressInfo> {
        let state = match self.state.as_str() {
            "Alive" => AddressState::Alive,
            "Forbidden" => AddressState::Forbidden,
            "Removed" => AddressState::Removed,
            other => return Err(StoreError::Decode(format!("unknown address state {other}"))),
        };
        Ok(AddressInfo {
            addr: Address::new(self.addr),
            nonce: self.nonce as u64,
            state,
            sel_msg_num: self.sel_msg_num as u64,
            fee_params: FeeParams {
                gas_over_estimation: self.gas_over_estimation,
                gas_over_premium: self.gas_over_premium,
                max_fee: self
                    .max_fee
                    .map(|v| v.parse())
                    .transpose()
                    .map_err(|_| StoreError::Decode("max_fee".into()))?,
                gas_fee_cap: self
                    .gas_fee_cap
                    .map(|v| v.parse())
                    .transpose()
                    .map_err(|_| StoreError::Decode("gas_fee_cap".into()))?,
                base_fee: self
                    .base_fee
                    .map(|v| v.parse())
                    .transpose()
                    .map_err(|_| StoreError::Decode("base_fee".into()))?,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub fn address_state_str(state: AddressState) -> &'static str {
    match state {
        AddressState::Alive => "Alive",
        AddressState::Forbidden => "Forbidden",
        AddressState::Removed => "Removed",
    }
}

#[derive(sqlx::FromRow)]
pub struct SharedParamsRow {
    pub sel_msg_num: i64,
    pub gas_over_estimation: f64,
    pub gas_over_premium: f64,
    pub max_fee: String,
    pub gas_fee_cap: String,
    pub base_fee: String,
}

impl SharedParamsRow {
    pub fn into_shared_params(self) -> StoreResult<SharedParams> {
        Ok(SharedParams {
            sel_msg_num: self.sel_msg_num as u64,
            gas_over_estimation: self.gas_over_estimation,
            gas_over_premium: self.gas_over_premium,
            max_fee: self.max_fee.parse().map_err(|_| StoreError::Decode("max_fee".into()))?,
            gas_fee_cap: self
                .gas_fee_cap
                .parse()
                .map_err(|_| StoreError::Decode("gas_fee_cap".into()))?,
            base_fee: self.base_fee.parse().map_err(|_| StoreError::Decode("base_fee".into()))?,
        })
    }
}
