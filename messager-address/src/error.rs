// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use messager_core::address::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AddressServiceError {
    #[error("address {0} already exists")]
    AlreadyExists(Address),
    #[error("address {0} does not exist")]
    NotFound(Address),
    #[error(transparent)]
    Store(#[from] messager_store::StoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AddressServiceResult<T> = Result<T, AddressServiceError>;
