// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use messager_core::permission::Permission;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("method {method} requires {required:?} permission")]
    PermissionDenied {
        method: &'static str,
        required: Permission,
    },
    #[error(transparent)]
    Address(#[from] messager_address::AddressServiceError),
    #[error(transparent)]
    Store(#[from] messager_store::StoreError),
    #[error(transparent)]
    Selector(#[from] messager_selector::SelectorError),
    #[error(transparent)]
    HeadTracker(#[from] messager_headtracker::HeadTrackerError),
    #[error("message {0} not found")]
    MessageNotFound(uuid::Uuid),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
