// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Storage layer: the SQLite-backed repository, the in-memory message
//! cache that sits in front of it, and the shared-params snapshot service.

pub mod cache;
pub mod error;
pub mod repository;
pub mod shared_params_service;

pub use cache::MessageCache;
pub use error::{StoreError, StoreResult};
pub use repository::SqliteRepository;
pub use shared_params_service::SharedParamsService;
