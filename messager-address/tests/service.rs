// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use async_trait::async_trait;
use messager_address::{AddressService, AddressServiceError};
use messager_core::address::Address;
use messager_core::address_info::FeeParams;
use messager_core::rpc::AuthClient;
use messager_store::SqliteRepository;

struct FakeAuth;

#[async_trait]
impl AuthClient for FakeAuth {
    async fn get_user_by_signer(&self, addr: &Address) -> anyhow::Result<Vec<String>> {
        if addr.as_str() == "f0no-signer" {
            Ok(Vec::new())
        } else {
            Ok(vec!["alice".to_string()])
        }
    }

    async fn signer_exist_in_user(&self, _user: &str, _addr: &Address) -> anyhow::Result<bool> {
        Ok(true)
    }

    async fn list_signers(&self, _user: &str) -> anyhow::Result<Vec<Address>> {
        Ok(Vec::new())
    }
}

async fn service() -> AddressService {
    let repo = SqliteRepository::connect("sqlite::memory:").await.unwrap();
    repo.migrate().await.unwrap();
    AddressService::new(Arc::new(repo), Arc::new(FakeAuth))
}

#[tokio::test]
async fn save_address_rejects_duplicates() {
    let svc = service().await;
    let addr = Address::new("f01234");
    svc.save_address(addr.clone()).await.unwrap();
    let err = svc.save_address(addr).await.unwrap_err();
    assert!(matches!(err, AddressServiceError::AlreadyExists(_)));
}

#[tokio::test]
async fn mutating_an_unknown_address_fails_with_not_found() {
    let svc = service().await;
    let addr = Address::new("f0999");
    let err = svc.update_nonce(&addr, 5).await.unwrap_err();
    assert!(matches!(err, AddressServiceError::NotFound(_)));
}

#[tokio::test]
async fn fee_params_and_select_msg_num_round_trip() {
    let svc = service().await;
    let addr = Address::new("f01234");
    svc.save_address(addr.clone()).await.unwrap();

    svc.set_select_msg_num(&addr, 10).await.unwrap();
    let fee = FeeParams {
        max_fee: Some(1_000_000),
        ..Default::default()
    };
    svc.set_fee_params(&addr, &fee).await.unwrap();

    let info = svc.get(&addr).await.unwrap();
    assert_eq!(info.sel_msg_num, 10);
    assert_eq!(info.fee_params.max_fee, Some(1_000_000));
}

#[tokio::test]
async fn forbidding_removes_address_from_active_set() {
    let svc = service().await;
    let addr = Address::new("f01234");
    svc.save_address(addr.clone()).await.unwrap();
    assert!(svc.active_addresses().await.unwrap().contains(&addr));

    svc.forbidden(&addr).await.unwrap();
    assert!(!svc.active_addresses().await.unwrap().contains(&addr));

    svc.activate(&addr).await.unwrap();
    assert!(svc.active_addresses().await.unwrap().contains(&addr));
}

#[tokio::test]
async fn signer_lookup_reports_empty_for_disabled_addresses() {
    let svc = service().await;
    let signers = svc.get_accounts_of_signer(&Address::new("f0no-signer")).await.unwrap();
    assert!(signers.is_empty());

    let signers = svc.get_accounts_of_signer(&Address::new("f01234")).await.unwrap();
    assert_eq!(signers, vec!["alice".to_string()]);
}
