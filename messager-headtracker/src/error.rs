// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeadTrackerError {
    #[error("reorg gap of {found} epochs exceeds look-back limit of {limit}")]
    ReorgGapExceeded { found: i64, limit: i64 },
    #[error("parent messages ({messages}) and parent receipts ({receipts}) length mismatch")]
    InternalInvariantViolation { messages: usize, receipts: usize },
    #[error(transparent)]
    Store(#[from] messager_store::StoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type HeadTrackerResult<T> = Result<T, HeadTrackerError>;
