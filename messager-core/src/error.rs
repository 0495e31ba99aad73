// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Error kinds shared across the pipeline. Synchronous admin-command errors
/// propagate one of these verbatim and never mutate state; round-internal
/// failures (`EstimateFailed`, `SignFailed`, ...) are instead recorded on the
/// affected message row and do not surface here.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("address {0} is not registered")]
    AddressNotFound(String),
    #[error("address {0} is forbidden")]
    AddressForbidden(String),
    #[error("message id {0} already exists")]
    DuplicateMessageId(String),
    #[error("gas estimation failed: {0}")]
    EstimateFailed(String),
    #[error("sign msg: {0}")]
    SignFailed(String),
    #[error("chain node unavailable: {0}")]
    NodeUnavailable(String),
    #[error("chain node call timed out after {0:?}")]
    NodeTimeout(std::time::Duration),
    #[error("reorg gap of {found} epochs exceeds look-back limit of {limit}")]
    ReorgGapExceeded { found: i64, limit: i64 },
    #[error("parent messages ({messages}) and parent receipts ({receipts}) length mismatch")]
    InternalInvariantViolation { messages: usize, receipts: usize },
    #[error("message {0} is already on chain and cannot be replaced")]
    AlreadyOnChain(String),
    #[error("{0}")]
    Other(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
