// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;
use std::time::Duration;

use messager_core::address::Address;
use messager_core::address_info::AddressInfo;
use messager_core::message::{Message, MessageState, UnsignedMessage};
use messager_core::shared_params::SharedParams;
use messager_store::repository::{address_repo, message_repo};
use messager_store::{MessageCache, SharedParamsService, SqliteRepository};
use uuid::Uuid;

async fn memory_repo() -> SqliteRepository {
    let repo = SqliteRepository::connect("sqlite::memory:").await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn unfilled(from: &str) -> Message {
    Message::new_unfilled(
        Uuid::new_v4(),
        UnsignedMessage {
            from: Address::new(from),
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
async fn create_message_rejects_duplicate_id() {
    let repo = memory_repo().await;
    let msg = unfilled("f01234");
    message_repo::create_message(repo.pool(), &msg).await.unwrap();
    let err = message_repo::create_message(repo.pool(), &msg).await.unwrap_err();
    assert!(matches!(err, messager_store::StoreError::DuplicateMessageId(_)));
}

#[tokio::test]
async fn save_message_preserves_created_at() {
    let repo = memory_repo().await;
    let mut msg = unfilled("f01234");
    message_repo::create_message(repo.pool(), &msg).await.unwrap();
    let original_created_at = msg.created_at;

    msg.state = MessageState::FillMsg;
    msg.unsigned.nonce = 7;
    message_repo::save_message(repo.pool(), &msg).await.unwrap();

    let reloaded = message_repo::get_by_id(repo.pool(), msg.id).await.unwrap().unwrap();
    assert_eq!(reloaded.created_at, original_created_at);
    assert_eq!(reloaded.state, MessageState::FillMsg);
    assert_eq!(reloaded.unsigned.nonce, 7);
}

#[tokio::test]
async fn address_nonce_never_moves_backwards() {
    let repo = memory_repo().await;
    let addr = Address::new("f01234");
    address_repo::save_address(repo.pool(), &AddressInfo::new(addr.clone())).await.unwrap();

    address_repo::update_nonce(repo.pool(), &addr, 10).await.unwrap();
    address_repo::update_nonce(repo.pool(), &addr, 3).await.unwrap();

    let info = address_repo::get_address(repo.pool(), &addr).await.unwrap().unwrap();
    assert_eq!(info.nonce, 10);
}

#[tokio::test]
async fn update_nonce_on_missing_address_is_not_found() {
    let repo = memory_repo().await;
    let err = address_repo::update_nonce(repo.pool(), &Address::new("f0999"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, messager_store::StoreError::AddressNotFound(_)));
}

#[tokio::test]
async fn batch_save_is_transactional() {
    let repo = memory_repo().await;
    let msgs = vec![unfilled("f01234"), unfilled("f01234")];
    repo.transaction(|tx| {
        let msgs = msgs.clone();
        messager_store::repository::boxed(async move {
            messager_store::repository::message_repo::batch_save_messages(tx, &msgs).await
        })
    })
    .await
    .unwrap();

    for m in &msgs {
        assert!(message_repo::get_by_id(repo.pool(), m.id).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn cache_hits_without_touching_repository_then_falls_back_on_miss() {
    let repo = Arc::new(memory_repo().await);
    let msg = unfilled("f01234");
    message_repo::create_message(repo.pool(), &msg).await.unwrap();

    let cache = MessageCache::new(repo.clone(), 16, Duration::from_secs(60));
    assert!(cache.get_cached(msg.id).is_none());

    let fetched = cache.get(msg.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, msg.id);
    assert!(cache.get_cached(msg.id).is_some());
}

#[tokio::test]
async fn cache_mutate_updates_in_place() {
    let repo = Arc::new(memory_repo().await);
    let msg = unfilled("f01234");
    message_repo::create_message(repo.pool(), &msg).await.unwrap();

    let cache = MessageCache::new(repo, 16, Duration::from_secs(60));
    cache
        .mutate(msg.id, |m| m.state = MessageState::OnChainMsg)
        .await
        .unwrap();

    let updated = cache.get_cached(msg.id).unwrap();
    assert_eq!(updated.state, MessageState::OnChainMsg);
}

#[tokio::test]
async fn shared_params_service_round_trips_through_the_database() {
    let repo = Arc::new(memory_repo().await);
    let service = SharedParamsService::load(repo.clone()).await.unwrap();
    assert_eq!(service.get().sel_msg_num, SharedParams::default().sel_msg_num);

    let mut updated = SharedParams::default();
    updated.sel_msg_num = 42;
    service.set(updated.clone()).await.unwrap();
    assert_eq!(service.get().sel_msg_num, 42);

    let reloaded = SharedParamsService::load(repo).await.unwrap();
    assert_eq!(reloaded.get().sel_msg_num, 42);
}
