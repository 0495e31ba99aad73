// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Owns the set of managed addresses (§4.4): creation, nonce and state
//! bookkeeping, per-address fee overrides, and signer lookup through the
//! auth collaborator.

use std::collections::HashSet;
use std::sync::Arc;

use messager_core::address::Address;
use messager_core::address_info::{AddressInfo, AddressState, FeeParams};
use messager_core::rpc::AuthClient;
use messager_store::repository::address_repo;
use messager_store::SqliteRepository;

use crate::error::{AddressServiceError, AddressServiceResult};

pub struct AddressService {
    repo: Arc<SqliteRepository>,
    auth: Arc<dyn AuthClient>,
}

impl AddressService {
    pub fn new(repo: Arc<SqliteRepository>, auth: Arc<dyn AuthClient>) -> Self {
        AddressService { repo, auth }
    }

    pub async fn save_address(&self, addr: Address) -> AddressServiceResult<AddressInfo> {
        let info = AddressInfo::new(addr);
        match address_repo::save_address(self.repo.pool(), &info).await {
            Ok(()) => Ok(info),
            Err(messager_store::StoreError::DuplicateAddress(a)) => {
                Err(AddressServiceError::AlreadyExists(Address::new(a)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, addr: &Address) -> AddressServiceResult<AddressInfo> {
        address_repo::get_address(self.repo.pool(), addr)
            .await?
            .ok_or_else(|| AddressServiceError::NotFound(addr.clone()))
    }

    fn map_not_found(e: messager_store::StoreError, addr: &Address) -> AddressServiceError {
        match e {
            messager_store::StoreError::AddressNotFound(_) => {
                AddressServiceError::NotFound(addr.clone())
            }
            other => other.into(),
        }
    }

    pub async fn update_nonce(&self, addr: &Address, nonce: u64) -> AddressServiceResult<()> {
        address_repo::update_nonce(self.repo.pool(), addr, nonce)
            .await
            .map_err(|e| Self::map_not_found(e, addr))
    }

    pub async fn forbidden(&self, addr: &Address) -> AddressServiceResult<()> {
        address_repo::update_state(self.repo.pool(), addr, AddressState::Forbidden)
            .await
            .map_err(|e| Self::map_not_found(e, addr))
    }

    pub async fn activate(&self, addr: &Address) -> AddressServiceResult<()> {
        address_repo::update_state(self.repo.pool(), addr, AddressState::Alive)
            .await
            .map_err(|e| Self::map_not_found(e, addr))
    }

    pub async fn set_select_msg_num(&self, addr: &Address, n: u64) -> AddressServiceResult<()> {
        address_repo::set_select_msg_num(self.repo.pool(), addr, n)
            .await
            .map_err(|e| Self::map_not_found(e, addr))
    }

    /// A request where every field is `None` is a no-op, not an error.
    pub async fn set_fee_params(&self, addr: &Address, fee: &FeeParams) -> AddressServiceResult<()> {
        address_repo::set_fee_params(self.repo.pool(), addr, fee)
            .await
            .map_err(|e| Self::map_not_found(e, addr))
    }

    pub async fn list_active_address(&self) -> AddressServiceResult<Vec<AddressInfo>> {
        Ok(address_repo::list_active_addresses(self.repo.pool()).await?)
    }

    pub async fn active_addresses(&self) -> AddressServiceResult<HashSet<Address>> {
        Ok(self
            .list_active_address()
            .await?
            .into_iter()
            .map(|info| info.addr)
            .collect())
    }

    /// Returns the set of principal names able to sign for `addr`. An empty
    /// set means signing is disabled for that address and the Selector must
    /// abort its round for it (§4.5 step 1).
    pub async fn get_accounts_of_signer(&self, addr: &Address) -> AddressServiceResult<Vec<String>> {
        Ok(self.auth.get_user_by_signer(addr).await?)
    }
}
