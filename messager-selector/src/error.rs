// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use messager_core::address::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("no signing principal registered for address {0}")]
    NoSigner(Address),
    #[error("sign msg: {0}")]
    SignFailed(String),
    #[error("message {0} is already on chain and cannot be replaced")]
    AlreadyOnChain(uuid::Uuid),
    #[error("message {0} not found")]
    MessageNotFound(uuid::Uuid),
    #[error(transparent)]
    Store(#[from] messager_store::StoreError),
    #[error(transparent)]
    Address(#[from] messager_address::AddressServiceError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SelectorResult<T> = Result<T, SelectorError>;
