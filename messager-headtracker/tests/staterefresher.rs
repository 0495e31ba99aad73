// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use messager_address::AddressService;
use messager_core::address::Address;
use messager_core::cid::{MsgCid, TipsetKey};
use messager_core::message::{
    Message, MessageState, Receipt, Signature, SignatureType, UnsignedMessage,
};
use messager_core::rpc::{ActorState, AuthClient, ChainClient, EstimateMessage, EstimateResult, SignedMessageWire};
use messager_core::tipset::{ChainEpoch, HeadChange, Tipset};
use messager_headtracker::tracker::ResolvedHeadChange;
use messager_headtracker::StateRefresher;
use messager_store::repository::message_repo;
use messager_store::{MessageCache, SqliteRepository};
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

/// Reports a fixed set of parent messages/receipts for one known block cid,
/// and a fixed `state_search_msg` answer keyed by signed cid.
struct FakeChain {
    block_cid: MsgCid,
    parent_messages: Vec<(MsgCid, UnsignedMessage)>,
    parent_receipts: Vec<Receipt>,
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
    async fn chain_get_messages_in_tipset(&self, _key: &TipsetKey) -> anyhow::Result<Vec<UnsignedMessage>> {
        unimplemented!()
    }
    async fn chain_get_parent_messages(
        &self,
        block_cid: &MsgCid,
    ) -> anyhow::Result<Vec<(MsgCid, UnsignedMessage)>> {
        assert_eq!(block_cid, &self.block_cid);
        Ok(self.parent_messages.clone())
    }
    async fn chain_get_parent_receipts(&self, block_cid: &MsgCid) -> anyhow::Result<Vec<Receipt>> {
        assert_eq!(block_cid, &self.block_cid);
        Ok(self.parent_receipts.clone())
    }
    async fn state_get_actor(&self, _addr: &Address, _tsk: &TipsetKey) -> anyhow::Result<ActorState> {
        unimplemented!()
    }
    async fn state_search_msg(&self, _signed_cid: &MsgCid) -> anyhow::Result<Option<(Receipt, i64, TipsetKey)>> {
        Ok(None)
    }
    async fn gas_batch_estimate_message_gas(
        &self,
        _msgs: &[EstimateMessage],
        _from_nonce: u64,
        _tsk: &TipsetKey,
    ) -> anyhow::Result<Vec<EstimateResult>> {
        unimplemented!()
    }
    async fn mpool_push(&self, _msg: &SignedMessageWire) -> anyhow::Result<MsgCid> {
        unimplemented!()
    }
    async fn state_network_name(&self) -> anyhow::Result<String> {
        unimplemented!()
    }
}

async fn setup() -> (Arc<SqliteRepository>, Arc<MessageCache>, Arc<AddressService>, Address) {
    let repo = Arc::new(SqliteRepository::connect("sqlite::memory:").await.unwrap());
    repo.migrate().await.unwrap();
    let addr = Address::new("f01234");
    let addresses = Arc::new(AddressService::new(repo.clone(), Arc::new(FakeAuth)));
    addresses.save_address(addr.clone()).await.unwrap();
    let cache = Arc::new(MessageCache::new(repo.clone(), 100, Duration::from_secs(60)));
    (repo, cache, addresses, addr)
}

fn filled_message(addr: &Address, nonce: u64, signed_cid: &str, height: ChainEpoch) -> Message {
    let mut msg = Message::new_unfilled(
        Uuid::new_v4(),
        UnsignedMessage {
            from: addr.clone(),
            to: Address::new("f01000"),
            nonce,
            value: 0,
            gas_limit: 1_000_000,
            gas_fee_cap: 100,
            gas_premium: 10,
            method: 0,
            params: Vec::new(),
        },
        None,
    );
    msg.signature = Some(Signature {
        sig_type: SignatureType::Secp256k1,
        bytes: vec![1, 2, 3],
    });
    msg.unsigned_cid = Some(MsgCid::new(format!("unsigned-{nonce}")));
    msg.signed_cid = Some(MsgCid::new(signed_cid));
    msg.state = if height > 0 {
        MessageState::OnChainMsg
    } else {
        MessageState::FillMsg
    };
    msg.height = height;
    msg
}

#[tokio::test]
async fn an_applied_tipset_marks_its_matching_message_on_chain() {
    let (repo, cache, addresses, addr) = setup().await;
    let msg = filled_message(&addr, 5, "sig-5", 0);
    message_repo::create_message(repo.pool(), &msg).await.unwrap();

    let block_cid = MsgCid::new("block-1");
    let chain: Arc<dyn ChainClient> = Arc::new(FakeChain {
        block_cid: block_cid.clone(),
        parent_messages: vec![(MsgCid::new("sig-5"), msg.unsigned.clone())],
        parent_receipts: vec![Receipt {
            exit_code: 0,
            return_value: Vec::new(),
            gas_used: 500,
        }],
    });

    let refresher = StateRefresher::new(repo.clone(), cache.clone(), addresses.clone(), chain);
    let change = ResolvedHeadChange {
        apply: vec![Tipset {
            key: TipsetKey::new(vec![block_cid]),
            height: 10,
            parents: TipsetKey::default(),
            parent_base_fee: 0,
        }],
        revert_heights: Vec::new(),
        reconnect: false,
    };

    refresher.process(change).await.unwrap();

    let reloaded = message_repo::get_by_id(repo.pool(), msg.id).await.unwrap().unwrap();
    assert_eq!(reloaded.state, MessageState::OnChainMsg);
    assert_eq!(reloaded.height, 10);
}

#[tokio::test]
async fn a_reverted_height_rolls_a_confirmed_message_back_to_filled() {
    let (repo, cache, addresses, addr) = setup().await;
    let msg = filled_message(&addr, 7, "sig-7", 42);
    message_repo::create_message(repo.pool(), &msg).await.unwrap();

    let chain: Arc<dyn ChainClient> = Arc::new(FakeChain {
        block_cid: MsgCid::new("unused"),
        parent_messages: Vec::new(),
        parent_receipts: Vec::new(),
    });
    let refresher = StateRefresher::new(repo.clone(), cache.clone(), addresses.clone(), chain);
    let change = ResolvedHeadChange {
        apply: Vec::new(),
        revert_heights: vec![42],
        reconnect: false,
    };

    refresher.process(change).await.unwrap();

    let reloaded = message_repo::get_by_id(repo.pool(), msg.id).await.unwrap().unwrap();
    assert_eq!(reloaded.state, MessageState::FillMsg);
}

#[tokio::test]
async fn an_observed_cid_mismatch_marks_the_local_row_replaced() {
    let (repo, cache, addresses, addr) = setup().await;
    let msg = filled_message(&addr, 3, "sig-ours", 0);
    message_repo::create_message(repo.pool(), &msg).await.unwrap();

    let block_cid = MsgCid::new("block-2");
    let chain: Arc<dyn ChainClient> = Arc::new(FakeChain {
        block_cid: block_cid.clone(),
        parent_messages: vec![(MsgCid::new("sig-someone-elses"), msg.unsigned.clone())],
        parent_receipts: vec![Receipt {
            exit_code: 0,
            return_value: Vec::new(),
            gas_used: 500,
        }],
    });
    let refresher = StateRefresher::new(repo.clone(), cache.clone(), addresses.clone(), chain);
    let change = ResolvedHeadChange {
        apply: vec![Tipset {
            key: TipsetKey::new(vec![block_cid]),
            height: 11,
            parents: TipsetKey::default(),
            parent_base_fee: 0,
        }],
        revert_heights: Vec::new(),
        reconnect: false,
    };

    refresher.process(change).await.unwrap();

    let reloaded = message_repo::get_by_id(repo.pool(), msg.id).await.unwrap().unwrap();
    assert_eq!(reloaded.state, MessageState::ReplacedMsg);
    assert_eq!(reloaded.signed_cid, Some(MsgCid::new("sig-someone-elses")));
}
