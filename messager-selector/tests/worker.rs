// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use messager_address::AddressService;
use messager_core::address::Address;
use messager_core::address_info::AddressInfo;
use messager_core::cid::{MsgCid, TipsetKey};
use messager_core::message::{Message, MessageState, Receipt, Signature, SignatureType, UnsignedMessage};
use messager_core::rpc::{
    ActorState, AuthClient, ChainClient, EstimateMessage, EstimateResult, GasEstimate,
    SignedMessageWire, WalletClient,
};
use messager_core::tipset::{HeadChange, Tipset};
use messager_selector::config::SelectorConfig;
use messager_selector::worker::Worker;
use messager_store::repository::message_repo;
use messager_store::{MessageCache, SharedParamsService, SqliteRepository};
use tokio::sync::mpsc;
use uuid::Uuid;

struct FakeAuth;

#[async_trait]
impl AuthClient for FakeAuth {
    async fn get_user_by_signer(&self, _addr: &Address) -> anyhow::Result<Vec<String>> {
        Ok(vec!["alice".to_string()])
    }
    async fn signer_exist_in_user(&self, _user: &str, _addr: &Address) -> anyhow::Result<bool> {
        Ok(true)
    }
    async fn list_signers(&self, _user: &str) -> anyhow::Result<Vec<Address>> {
        Ok(Vec::new())
    }
}

struct FakeWallet {
    fail: bool,
}

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
        if self.fail {
            anyhow::bail!("signer offline");
        }
        Ok(Signature {
            sig_type: SignatureType::Secp256k1,
            bytes: vec![9, 9, 9],
        })
    }
}

struct FakeChain {
    nonce: AtomicU64,
}

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
        Ok(Vec::new())
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
        Ok(ActorState {
            nonce: self.nonce.load(Ordering::SeqCst),
            balance: u128::MAX,
        })
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
                    gas_fee_cap: 100,
                    gas_premium: 10,
                }),
            })
            .collect())
    }
    async fn mpool_push(&self, _msg: &SignedMessageWire) -> anyhow::Result<MsgCid> {
        Ok(MsgCid::new("bafy-onchain"))
    }
    async fn state_network_name(&self) -> anyhow::Result<String> {
        Ok("testnetnet".to_string())
    }
}

fn tip() -> Tipset {
    Tipset {
        key: TipsetKey::new(vec![MsgCid::new("bafy-tip")]),
        height: 100,
        parents: TipsetKey::default(),
        parent_base_fee: 0,
    }
}

async fn setup(wallet_fails: bool) -> (Arc<SqliteRepository>, Worker, Address, mpsc::Receiver<Vec<Message>>) {
    let repo = Arc::new(SqliteRepository::connect("sqlite::memory:").await.unwrap());
    repo.migrate().await.unwrap();
    let addr = Address::new("f01234");
    let addresses = Arc::new(AddressService::new(repo.clone(), Arc::new(FakeAuth)));
    addresses.save_address(addr.clone()).await.unwrap();

    let cache = Arc::new(MessageCache::new(repo.clone(), 100, Duration::from_secs(60)));
    let shared_params = Arc::new(SharedParamsService::load(repo.clone()).await.unwrap());
    let chain: Arc<dyn ChainClient> = Arc::new(FakeChain {
        nonce: AtomicU64::new(0),
    });
    let wallet: Arc<dyn WalletClient> = Arc::new(FakeWallet { fail: wallet_fails });
    let config = Arc::new(SelectorConfig::default());
    let (tx, rx) = mpsc::channel(16);

    let worker = Worker::new(
        addr.clone(),
        repo.clone(),
        cache,
        addresses,
        shared_params,
        chain,
        wallet,
        config,
        tx,
    );
    (repo, worker, addr, rx)
}

fn unfilled(addr: &Address) -> Message {
    Message::new_unfilled(
        Uuid::new_v4(),
        UnsignedMessage {
            from: addr.clone(),
            to: Address::new("f01000"),
            nonce: 0,
            value: 0,
            gas_limit: 0,
            gas_fee_cap: 0,
            gas_premium: 0,
            method: 0,
            params: Vec::new(),
        },
        None,
    )
}

#[tokio::test]
async fn assigns_sequential_nonces_and_emits_sorted_batch() {
    let (repo, worker, addr, mut rx) = setup(false).await;
    for _ in 0..3 {
        let msg = unfilled(&addr);
        message_repo::create_message(repo.pool(), &msg).await.unwrap();
    }

    worker.run_round(&tip()).await.unwrap();

    let batch = rx.try_recv().unwrap();
    assert_eq!(batch.len(), 3);
    let nonces: Vec<u64> = batch.iter().map(|m| m.nonce()).collect();
    assert_eq!(nonces, vec![0, 1, 2]);
    for m in &batch {
        assert_eq!(m.state, MessageState::FillMsg);
        assert!(m.signature.is_some());
    }

    let info = messager_store::repository::address_repo::get_address(repo.pool(), &addr)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(info.nonce, 3);
}

#[tokio::test]
async fn sign_failure_stops_the_round_without_leaving_a_nonce_hole() {
    let (repo, worker, addr, mut rx) = setup(true).await;
    let msg = unfilled(&addr);
    message_repo::create_message(repo.pool(), &msg).await.unwrap();

    worker.run_round(&tip()).await.unwrap();

    assert!(rx.try_recv().is_err());
    let reloaded = message_repo::get_by_id(repo.pool(), msg.id).await.unwrap().unwrap();
    assert_eq!(reloaded.state, MessageState::UnFillMsg);

    let info = messager_store::repository::address_repo::get_address(repo.pool(), &addr)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(info.nonce, 0);
}

#[tokio::test]
async fn back_pressure_only_rebroadcasts_existing_filled_messages() {
    let (repo, worker, addr, mut rx) = setup(false).await;
    messager_store::repository::address_repo::set_select_msg_num(repo.pool(), &addr, 1)
        .await
        .unwrap();

    for _ in 0..1 {
        let msg = unfilled(&addr);
        message_repo::create_message(repo.pool(), &msg).await.unwrap();
    }
    worker.run_round(&tip()).await.unwrap();
    let _ = rx.try_recv().unwrap();

    // cap is exhausted: one more UnFill message should not get a nonce, but
    // the already-filled one should be rebroadcast.
    let extra = unfilled(&addr);
    message_repo::create_message(repo.pool(), &extra).await.unwrap();
    worker.run_round(&tip()).await.unwrap();

    let batch = rx.try_recv().unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].nonce(), 0);

    let reloaded = message_repo::get_by_id(repo.pool(), extra.id).await.unwrap().unwrap();
    assert_eq!(reloaded.state, MessageState::UnFillMsg);
}
