// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! RPC client traits the core consumes. Implementations live outside this
//! crate (a JSON-RPC client against a real chain node/wallet/auth service in
//! production, in-memory fakes in tests); the core only depends on these
//! traits, never on a concrete transport.

use async_trait::async_trait;
use uuid::Uuid;

use crate::address::Address;
use crate::cid::{MsgCid, TipsetKey};
use crate::message::{Message, Receipt, Signature, UnsignedMessage};
use crate::tipset::{HeadChange, Tipset};

/// The chain actor state relevant to selection: its next expected nonce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActorState {
    pub nonce: u64,
    pub balance: u128,
}

/// One candidate submitted to `GasBatchEstimateMessageGas`, tagged with the
/// local message id so the result can be correlated back to its row.
#[derive(Clone, Debug)]
pub struct EstimateMessage {
    pub id: Uuid,
    pub msg: UnsignedMessage,
}

#[derive(Clone, Debug)]
pub struct EstimateResult {
    pub id: Uuid,
    pub result: Result<GasEstimate, String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasEstimate {
    pub gas_limit: i64,
    pub gas_fee_cap: u128,
    pub gas_premium: u128,
}

/// A fully signed message, ready for `MpoolPush`.
#[derive(Clone, Debug)]
pub struct SignedMessageWire {
    pub unsigned: UnsignedMessage,
    pub signature: Signature,
}

impl TryFrom<&Message> for SignedMessageWire {
    type Error = &'static str;

    fn try_from(msg: &Message) -> Result<Self, Self::Error> {
        let signature = msg.signature.clone().ok_or("message has no signature")?;
        Ok(SignedMessageWire {
            unsigned: msg.unsigned.clone(),
            signature,
        })
    }
}

/// Chain node RPC surface (§6). Every call carries an implicit per-call
/// timeout budget applied by the caller via `tokio::time::timeout`.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_head(&self) -> anyhow::Result<Tipset>;

    /// Subscribe to the apply/revert notification stream. Implementations
    /// deliver batches through the returned channel; the receiver end is
    /// owned by the head tracker.
    async fn chain_notify(&self) -> anyhow::Result<tokio::sync::mpsc::Receiver<HeadChange>>;

    async fn chain_get_tipset(&self, key: &TipsetKey) -> anyhow::Result<Tipset>;

    async fn chain_get_messages_in_tipset(
        &self,
        key: &TipsetKey,
    ) -> anyhow::Result<Vec<UnsignedMessage>>;

    async fn chain_get_parent_messages(
        &self,
        block_cid: &MsgCid,
    ) -> anyhow::Result<Vec<(MsgCid, UnsignedMessage)>>;

    async fn chain_get_parent_receipts(&self, block_cid: &MsgCid) -> anyhow::Result<Vec<Receipt>>;

    async fn state_get_actor(&self, addr: &Address, tsk: &TipsetKey) -> anyhow::Result<ActorState>;

    /// Returns `None` when the message has not been observed on chain.
    async fn state_search_msg(
        &self,
        signed_cid: &MsgCid,
    ) -> anyhow::Result<Option<(Receipt, i64, TipsetKey)>>;

    async fn gas_batch_estimate_message_gas(
        &self,
        msgs: &[EstimateMessage],
        from_nonce: u64,
        tsk: &TipsetKey,
    ) -> anyhow::Result<Vec<EstimateResult>>;

    async fn mpool_push(&self, msg: &SignedMessageWire) -> anyhow::Result<MsgCid>;

    async fn state_network_name(&self) -> anyhow::Result<String>;
}

/// Wallet (signing) service RPC surface (§6).
#[async_trait]
pub trait WalletClient: Send + Sync {
    async fn wallet_has(&self, account: &str, addr: &Address) -> anyhow::Result<bool>;

    /// `digest` is the unsigned message's CID bytes; `meta` in the spec's
    /// `{type: ChainMsg, extra: raw_block}` shape is represented by passing
    /// the raw serialized block alongside the digest.
    async fn wallet_sign(
        &self,
        addr: &Address,
        accounts: &[String],
        digest: &[u8],
        raw_block: &[u8],
    ) -> anyhow::Result<Signature>;
}

/// Auth service RPC surface (§6), used to derive permitted signing
/// principals per managed address.
#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn get_user_by_signer(&self, addr: &Address) -> anyhow::Result<Vec<String>>;

    async fn signer_exist_in_user(&self, user: &str, addr: &Address) -> anyhow::Result<bool>;

    async fn list_signers(&self, user: &str) -> anyhow::Result<Vec<Address>>;
}
