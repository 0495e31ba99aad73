// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use async_trait::async_trait;
use messager_core::address::Address;
use messager_core::cid::{MsgCid, TipsetKey};
use messager_core::message::{Message, MessageState, Receipt, Signature, SignatureType, UnsignedMessage};
use messager_core::rpc::{
    ActorState, ChainClient, EstimateMessage, EstimateResult, GasEstimate, SignedMessageWire,
    WalletClient,
};
use messager_core::tipset::{HeadChange, Tipset};
use messager_selector::{replace, ReplaceRequest, SelectorError};
use messager_store::repository::message_repo;
use messager_store::SqliteRepository;
use uuid::Uuid;

struct FakeWallet;

#[async_trait]
impl WalletClient for FakeWallet {
    async fn wallet_has(&self, _account: &str, _addr: &Address) -> anyhow::Result<bool> {
        Ok(true)
    }
    async fn wallet_sign(
        &self,
        _addr: &Address,
        _accounts: &[String],
        _digest: &[u8],
        _raw_block: &[u8],
    ) -> anyhow::Result<Signature> {
        Ok(Signature {
            sig_type: SignatureType::Secp256k1,
            bytes: vec![7, 7, 7],
        })
    }
}

struct FakeChain;

#[async_trait]
impl ChainClient for FakeChain {
    async fn chain_head(&self) -> anyhow::Result<Tipset> {
        unimplemented!()
    }
    async fn chain_notify(&self) -> anyhow::Result<tokio::sync::mpsc::Receiver<HeadChange>> {
        unimplemented!()
    }
    async fn chain_get_tipset(&self, _key: &TipsetKey) -> anyhow::Result<Tipset> {
        unimplemented!()
    }
    async fn chain_get_messages_in_tipset(
        &self,
        _key: &TipsetKey,
    ) -> anyhow::Result<Vec<UnsignedMessage>> {
        unimplemented!()
    }
    async fn chain_get_parent_messages(
        &self,
        _block_cid: &MsgCid,
    ) -> anyhow::Result<Vec<(MsgCid, UnsignedMessage)>> {
        unimplemented!()
    }
    async fn chain_get_parent_receipts(&self, _block_cid: &MsgCid) -> anyhow::Result<Vec<Receipt>> {
        unimplemented!()
    }
    async fn state_get_actor(&self, _addr: &Address, _tsk: &TipsetKey) -> anyhow::Result<ActorState> {
        unimplemented!()
    }
    async fn state_search_msg(
        &self,
        _signed_cid: &MsgCid,
    ) -> anyhow::Result<Option<(Receipt, i64, TipsetKey)>> {
        unimplemented!()
    }
    async fn gas_batch_estimate_message_gas(
        &self,
        msgs: &[EstimateMessage],
        _from_nonce: u64,
        _tsk: &TipsetKey,
    ) -> anyhow::Result<Vec<EstimateResult>> {
        Ok(msgs
            .iter()
            .map(|m| EstimateResult {
                id: m.id,
                result: Ok(GasEstimate {
                    gas_limit: 1_000_000,
                    gas_fee_cap: 200,
                    gas_premium: 20,
                }),
            })
            .collect())
    }
    async fn mpool_push(&self, _msg: &SignedMessageWire) -> anyhow::Result<MsgCid> {
        Ok(MsgCid::new("bafy-replaced"))
    }
    async fn state_network_name(&self) -> anyhow::Result<String> {
        unimplemented!()
    }
}

async fn filled_message(repo: &SqliteRepository) -> Message {
    let mut msg = Message::new_unfilled(
        Uuid::new_v4(),
        UnsignedMessage {
            from: Address::new("f01234"),
            to: Address::new("f01000"),
            nonce: 5,
            value: 0,
            gas_limit: 500_000,
            gas_fee_cap: 50,
            gas_premium: 10,
            method: 0,
            params: Vec::new(),
        },
        None,
    );
    msg.state = MessageState::FillMsg;
    msg.signature = Some(Signature {
        sig_type: SignatureType::Secp256k1,
        bytes: vec![1],
    });
    msg.unsigned_cid = Some(MsgCid::new("bafy-original"));
    msg.signed_cid = Some(MsgCid::new("bafy-original-signed"));
    message_repo::create_message(repo.pool(), &msg).await.unwrap();
    msg
}

#[tokio::test]
async fn auto_replace_bumps_premium_above_minimum_rbf() {
    let repo = Arc::new(SqliteRepository::connect("sqlite::memory:").await.unwrap());
    repo.migrate().await.unwrap();
    let msg = filled_message(&repo).await;

    let chain: Arc<dyn ChainClient> = Arc::new(FakeChain);
    let wallet: Arc<dyn WalletClient> = Arc::new(FakeWallet);
    let req = ReplaceRequest {
        id: msg.id,
        auto: true,
        max_fee: None,
        gas_limit: None,
        gas_premium: None,
        gas_fee_cap: None,
    };

    let replaced = replace(&repo, &chain, &wallet, &["alice".to_string()], &TipsetKey::default(), req)
        .await
        .unwrap();

    assert!(replaced.unsigned.gas_premium >= 12); // 10 * 1.25 minimum bump
    assert!(replaced.unsigned.gas_fee_cap >= replaced.unsigned.gas_premium);
    assert_ne!(replaced.signed_cid, Some(MsgCid::new("bafy-original-signed")));
    assert_eq!(replaced.state, MessageState::FillMsg);
}

#[tokio::test]
async fn manual_replace_only_overrides_provided_fields() {
    let repo = Arc::new(SqliteRepository::connect("sqlite::memory:").await.unwrap());
    repo.migrate().await.unwrap();
    let msg = filled_message(&repo).await;

    let chain: Arc<dyn ChainClient> = Arc::new(FakeChain);
    let wallet: Arc<dyn WalletClient> = Arc::new(FakeWallet);
    let req = ReplaceRequest {
        id: msg.id,
        auto: false,
        max_fee: None,
        gas_limit: None,
        gas_premium: Some(99),
        gas_fee_cap: None,
    };

    let replaced = replace(&repo, &chain, &wallet, &["alice".to_string()], &TipsetKey::default(), req)
        .await
        .unwrap();

    assert_eq!(replaced.unsigned.gas_premium, 99);
    assert_eq!(replaced.unsigned.gas_fee_cap, msg.unsigned.gas_fee_cap);
    assert_eq!(replaced.unsigned.gas_limit, msg.unsigned.gas_limit);
}

#[tokio::test]
async fn replacing_an_on_chain_message_is_rejected() {
    let repo = Arc::new(SqliteRepository::connect("sqlite::memory:").await.unwrap());
    repo.migrate().await.unwrap();
    let mut msg = filled_message(&repo).await;
    msg.state = MessageState::OnChainMsg;
    msg.height = 100;
    msg.receipt = Some(Receipt {
        exit_code: 0,
        return_value: Vec::new(),
        gas_used: 1,
    });
    message_repo::save_message(repo.pool(), &msg).await.unwrap();

    let chain: Arc<dyn ChainClient> = Arc::new(FakeChain);
    let wallet: Arc<dyn WalletClient> = Arc::new(FakeWallet);
    let req = ReplaceRequest {
        id: msg.id,
        auto: true,
        max_fee: None,
        gas_limit: None,
        gas_premium: None,
        gas_fee_cap: None,
    };

    let err = replace(&repo, &chain, &wallet, &["alice".to_string()], &TipsetKey::default(), req)
        .await
        .unwrap_err();
    assert!(matches!(err, SelectorError::AlreadyOnChain(_)));
}
