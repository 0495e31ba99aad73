// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("message {0} not found")]
    MessageNotFound(String),
    #[error("address {0} not found")]
    AddressNotFound(String),
    #[error("message {0} already exists")]
    DuplicateMessageId(String),
    #[error("address {0} already exists")]
    DuplicateAddress(String),
    #[error("failed to decode stored row: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
