// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! A transactional row store over SQLite, exposing one query module per
//! entity (§4.1). Every function in [`address_repo`], [`message_repo`],
//! [`node_repo`] and [`shared_params_repo`] is generic over
//! `sqlx::SqliteExecutor`, so the same function runs against the pool
//! directly or against an open [`sqlx::Transaction`] — callers that touch
//! more than one row in a single unit of work go through
//! [`SqliteRepository::transaction`].

pub mod address_repo;
pub mod message_repo;
pub mod node_repo;
mod row;
pub mod shared_params_repo;

use std::future::Future;

use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};

use crate::error::StoreResult;

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let options: SqliteConnectOptions = database_url.parse()?;
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options.create_if_missing(true))
            .await?;
        Ok(SqliteRepository { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs `f` inside a single SQLite transaction, committing on `Ok` and
    /// rolling back on `Err`. This is the `Transaction(fn)` primitive from
    /// §4.1: every multi-row write in the selector and state refresher goes
    /// through this.
    pub async fn transaction<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: for<'c> FnOnce(&'c mut sqlx::Transaction<'_, Sqlite>) -> BoxFuture<'c, StoreResult<T>> + Send,
        T: Send,
    {
        let mut tx = self.pool.begin().await.map_err(crate::error::StoreError::Database)?;
        match f(&mut tx).await {
            Ok(value) => {
                tx.commit().await.map_err(crate::error::StoreError::Database)?;
                Ok(value)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }
}

/// Helper to box an async closure body for [`SqliteRepository::transaction`]
/// without callers having to spell out `Box::pin` at every call site.
pub fn boxed<'c, T, Fut>(fut: Fut) -> BoxFuture<'c, T>
where
    Fut: Future<Output = T> + Send + 'c,
{
    Box::pin(fut)
}
