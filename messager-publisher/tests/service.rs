// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use messager_core::address::Address;
use messager_core::cid::{MsgCid, TipsetKey};
use messager_core::message::{Message, MsgMeta, Signature, SignatureType, UnsignedMessage};
use messager_core::rpc::{ActorState, ChainClient, EstimateMessage, EstimateResult, SignedMessageWire};
use messager_core::tipset::{HeadChange, Tipset};
use messager_publisher::Publisher;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct RecordingNode {
    pushes: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait]
impl ChainClient for RecordingNode {
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
    async fn chain_get_parent_receipts(
        &self,
        _block_cid: &MsgCid,
    ) -> anyhow::Result<Vec<messager_core::message::Receipt>> {
        unimplemented!()
    }
    async fn state_get_actor(&self, _addr: &Address, _tsk: &TipsetKey) -> anyhow::Result<ActorState> {
        unimplemented!()
    }
    async fn state_search_msg(
        &self,
        _signed_cid: &MsgCid,
    ) -> anyhow::Result<Option<(messager_core::message::Receipt, i64, TipsetKey)>> {
        unimplemented!()
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
        if self.fail {
            anyhow::bail!("node unreachable");
        }
        self.pushes.fetch_add(1, Ordering::SeqCst);
        Ok(MsgCid::new("bafy-pushed"))
    }
    async fn state_network_name(&self) -> anyhow::Result<String> {
        unimplemented!()
    }
}

fn signed_message() -> Message {
    let mut msg = Message::new_unfilled(
        Uuid::new_v4(),
        UnsignedMessage {
            from: Address::new("f01234"),
            to: Address::new("f01000"),
            nonce: 0,
            value: 0,
            gas_limit: 0,
            gas_fee_cap: 0,
            gas_premium: 0,
            method: 0,
            params: Vec::new(),
        },
        Option::<MsgMeta>::None,
    );
    msg.signature = Some(Signature {
        sig_type: SignatureType::Secp256k1,
        bytes: vec![1, 2, 3],
    });
    msg
}

#[tokio::test]
async fn pushes_to_primary_and_secondary_nodes() {
    let primary_pushes = Arc::new(AtomicUsize::new(0));
    let secondary_pushes = Arc::new(AtomicUsize::new(0));
    let primary = Arc::new(RecordingNode {
        pushes: primary_pushes.clone(),
        fail: false,
    });
    let secondary = Arc::new(RecordingNode {
        pushes: secondary_pushes.clone(),
        fail: false,
    });

    let (tx, rx) = mpsc::channel(4);
    let publisher = Publisher::new(primary, vec![secondary], rx);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(publisher.run(cancel.clone()));

    tx.send(vec![signed_message()]).await.unwrap();
    drop(tx);
    handle.await.unwrap();

    assert_eq!(primary_pushes.load(Ordering::SeqCst), 1);
    assert_eq!(secondary_pushes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn a_failing_secondary_node_does_not_stop_the_batch() {
    let primary_pushes = Arc::new(AtomicUsize::new(0));
    let primary = Arc::new(RecordingNode {
        pushes: primary_pushes.clone(),
        fail: false,
    });
    let failing_secondary = Arc::new(RecordingNode {
        pushes: Arc::new(AtomicUsize::new(0)),
        fail: true,
    });

    let (tx, rx) = mpsc::channel(4);
    let publisher = Publisher::new(primary, vec![failing_secondary], rx);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(publisher.run(cancel.clone()));

    tx.send(vec![signed_message(), signed_message()]).await.unwrap();
    drop(tx);
    handle.await.unwrap();

    assert_eq!(primary_pushes.load(Ordering::SeqCst), 2);
}
