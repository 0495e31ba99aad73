// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use async_trait::async_trait;
use messager::dispatcher::{Dispatcher, Response};
use messager::error::DispatchError;
use messager::rpc_stub::{UnconfiguredChainClient, UnconfiguredWalletClient};
use messager_address::AddressService;
use messager_core::address::Address;
use messager_core::message::UnsignedMessage;
use messager_core::permission::Permission;
use messager_core::rpc::AuthClient;
use messager_headtracker::StateRefresher;
use messager_store::{MessageCache, SharedParamsService, SqliteRepository};

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

async fn dispatcher() -> Dispatcher {
    let repo = Arc::new(SqliteRepository::connect("sqlite::memory:").await.unwrap());
    repo.migrate().await.unwrap();
    let cache = Arc::new(MessageCache::new(repo.clone(), 100, std::time::Duration::from_secs(60)));
    let chain: Arc<dyn messager_core::rpc::ChainClient> = Arc::new(UnconfiguredChainClient);
    let wallet: Arc<dyn messager_core::rpc::WalletClient> = Arc::new(UnconfiguredWalletClient);
    let auth: Arc<dyn AuthClient> = Arc::new(FakeAuth);
    let addresses = Arc::new(AddressService::new(repo.clone(), auth));
    let shared_params = Arc::new(SharedParamsService::load(repo.clone()).await.unwrap());
    let refresher = Arc::new(StateRefresher::new(
        repo.clone(),
        cache.clone(),
        addresses.clone(),
        chain.clone(),
    ));
    Dispatcher::new(repo, cache, addresses, shared_params, chain, wallet, refresher)
}

fn sample_unsigned() -> UnsignedMessage {
    UnsignedMessage {
        from: Address::new("f01234"),
        to: Address::new("f05678"),
        nonce: 0,
        value: 100,
        gas_limit: 0,
        gas_fee_cap: 0,
        gas_premium: 0,
        method: 0,
        params: Vec::new(),
    }
}

#[tokio::test]
async fn a_read_grant_cannot_push_a_message() {
    let dispatcher = dispatcher().await;
    let command = messager::dispatcher::Command::PushMessage(sample_unsigned(), None, None);
    let err = dispatcher
        .dispatch(Permission::Read, command)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::PermissionDenied { .. }));
}

#[tokio::test]
async fn a_write_grant_can_push_and_read_its_own_message() {
    let dispatcher = dispatcher().await;
    let push = messager::dispatcher::Command::PushMessage(sample_unsigned(), None, None);
    let response = dispatcher.dispatch(Permission::Write, push).await.unwrap();
    let id = match response {
        Response::Message(Some(msg)) => msg.id,
        other => panic!("expected a message, got {other:?}"),
    };

    let get = messager::dispatcher::Command::GetMessageByUid(id);
    let response = dispatcher.dispatch(Permission::Read, get).await.unwrap();
    match response {
        Response::Message(Some(msg)) => assert_eq!(msg.id, id),
        other => panic!("expected the pushed message back, got {other:?}"),
    }
}

#[tokio::test]
async fn recovering_a_message_that_has_not_failed_is_rejected() {
    let dispatcher = dispatcher().await;
    let push = messager::dispatcher::Command::PushMessage(sample_unsigned(), None, None);
    let response = dispatcher.dispatch(Permission::Write, push).await.unwrap();
    let id = match response {
        Response::Message(Some(msg)) => msg.id,
        other => panic!("expected a message, got {other:?}"),
    };

    let recover = messager::dispatcher::Command::RecoverFailedMsg(id);
    let err = dispatcher
        .dispatch(Permission::Admin, recover)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Other(_)));
}
