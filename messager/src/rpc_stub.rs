// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The chain node, wallet and auth services are external collaborators,
//! specified only by the RPC surface they expose (§6) and deliberately out
//! of this system's scope. These placeholders satisfy the trait objects the
//! process wiring needs to construct; a real deployment swaps them for a
//! transport that actually talks to a Lotus-style node, a remote wallet and
//! an auth service, without touching anything downstream of the trait.

use async_trait::async_trait;
use messager_core::address::Address;
use messager_core::cid::{MsgCid, TipsetKey};
use messager_core::message::{Receipt, Signature, UnsignedMessage};
use messager_core::rpc::{
    ActorState, AuthClient, ChainClient, EstimateMessage, EstimateResult, SignedMessageWire, WalletClient,
};
use messager_core::tipset::{HeadChange, Tipset};

fn unconfigured(call: &str) -> anyhow::Error {
    anyhow::anyhow!("{call}: no chain/wallet/auth RPC client configured for this deployment")
}

pub struct UnconfiguredChainClient;

#[async_trait]
impl ChainClient for UnconfiguredChainClient {
    async fn chain_head(&self) -> anyhow::Result<Tipset> {
        Err(unconfigured("chain_head"))
    }
    async fn chain_notify(&self) -> anyhow::Result<tokio::sync::mpsc::Receiver<HeadChange>> {
        Err(unconfigured("chain_notify"))
    }
    async fn chain_get_tipset(&self, _key: &TipsetKey) -> anyhow::Result<Tipset> {
        Err(unconfigured("chain_get_tipset"))
    }
    async fn chain_get_messages_in_tipset(&self, _key: &TipsetKey) -> anyhow::Result<Vec<UnsignedMessage>> {
        Err(unconfigured("chain_get_messages_in_tipset"))
    }
    async fn chain_get_parent_messages(
        &self,
        _block_cid: &MsgCid,
    ) -> anyhow::Result<Vec<(MsgCid, UnsignedMessage)>> {
        Err(unconfigured("chain_get_parent_messages"))
    }
    async fn chain_get_parent_receipts(&self, _block_cid: &MsgCid) -> anyhow::Result<Vec<Receipt>> {
        Err(unconfigured("chain_get_parent_receipts"))
    }
    async fn state_get_actor(&self, _addr: &Address, _tsk: &TipsetKey) -> anyhow::Result<ActorState> {
        Err(unconfigured("state_get_actor"))
    }
    async fn state_search_msg(&self, _signed_cid: &MsgCid) -> anyhow::Result<Option<(Receipt, i64, TipsetKey)>> {
        Err(unconfigured("state_search_msg"))
    }
    async fn gas_batch_estimate_message_gas(
        &self,
        _msgs: &[EstimateMessage],
        _from_nonce: u64,
        _tsk: &TipsetKey,
    ) -> anyhow::Result<Vec<EstimateResult>> {
        Err(unconfigured("gas_batch_estimate_message_gas"))
    }
    async fn mpool_push(&self, _msg: &SignedMessageWire) -> anyhow::Result<MsgCid> {
        Err(unconfigured("mpool_push"))
    }
    async fn state_network_name(&self) -> anyhow::Result<String> {
        Err(unconfigured("state_network_name"))
    }
}

pub struct UnconfiguredWalletClient;

#[async_trait]
impl WalletClient for UnconfiguredWalletClient {
    async fn wallet_has(&self, _account: &str, _addr: &Address) -> anyhow::Result<bool> {
        Err(unconfigured("wallet_has"))
    }
    async fn wallet_sign(
        &self,
        _addr: &Address,
        _accounts: &[String],
        _digest: &[u8],
        _raw_block: &[u8],
    ) -> anyhow::Result<Signature> {
        Err(unconfigured("wallet_sign"))
    }
}

pub struct UnconfiguredAuthClient;

#[async_trait]
impl AuthClient for UnconfiguredAuthClient {
    async fn get_user_by_signer(&self, _addr: &Address) -> anyhow::Result<Vec<String>> {
        Err(unconfigured("get_user_by_signer"))
    }
    async fn signer_exist_in_user(&self, _user: &str, _addr: &Address) -> anyhow::Result<bool> {
        Err(unconfigured("signer_exist_in_user"))
    }
    async fn list_signers(&self, _user: &str) -> anyhow::Result<Vec<Address>> {
        Err(unconfigured("list_signers"))
    }
}
