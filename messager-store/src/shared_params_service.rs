// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Process-wide view of the tunable gas/selection parameters (§4.3). Reads
//! never block on the database: callers get a cheap atomic snapshot of
//! whatever was last persisted or pushed through `set`.

use std::sync::Arc;

use arc_swap::ArcSwap;
use messager_core::shared_params::SharedParams;

use crate::error::StoreResult;
use crate::repository::{shared_params_repo, SqliteRepository};

pub struct SharedParamsService {
    repo: Arc<SqliteRepository>,
    current: ArcSwap<SharedParams>,
}

impl SharedParamsService {
    /// Loads the persisted row (or defaults, if none has ever been written)
    /// and holds it as the initial snapshot.
    pub async fn load(repo: Arc<SqliteRepository>) -> StoreResult<Self> {
        let params = shared_params_repo::get_shared_params(repo.pool()).await?;
        Ok(SharedParamsService {
            repo,
            current: ArcSwap::from_pointee(params),
        })
    }

    /// Cheap, lock-free read of the current snapshot.
    pub fn get(&self) -> Arc<SharedParams> {
        self.current.load_full()
    }

    /// Persists `params` and publishes it as the new snapshot. Readers that
    /// already hold a prior `Arc<SharedParams>` keep seeing the old values
    /// until they call `get` again.
    pub async fn set(&self, params: SharedParams) -> StoreResult<()> {
        shared_params_repo::set_shared_params(self.repo.pool(), &params).await?;
        self.current.store(Arc::new(params));
        Ok(())
    }

    /// Re-reads the persisted row and republishes it, picking up any change
    /// made out of process (e.g. directly against the database).
    pub async fn refresh(&self) -> StoreResult<()> {
        let params = shared_params_repo::get_shared_params(self.repo.pool()).await?;
        self.current.store(Arc::new(params));
        Ok(())
    }
}
