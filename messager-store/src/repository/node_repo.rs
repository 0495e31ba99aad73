// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use messager_core::address_info::Node;

use crate::error::StoreResult;

pub async fn upsert_node<'e, E>(exec: E, node: &Node) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO nodes (name, url, token) VALUES (?, ?, ?) \
         ON CONFLICT(name) DO UPDATE SET url = excluded.url, token = excluded.token",
    )
    .bind(&node.name)
    .bind(&node.url)
    .bind(&node.token)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn remove_node<'e, E>(exec: E, name: &str) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM nodes WHERE name = ?").bind(name).execute(exec).await?;
    Ok(())
}

pub async fn list_nodes<'e, E>(exec: E) -> StoreResult<Vec<Node>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let rows: Vec<(String, String, Option<String>)> =
        sqlx::query_as("SELECT name, url, token FROM nodes").fetch_all(exec).await?;
    Ok(rows
        .into_iter()
        .map(|(name, url, token)| Node { name, url, token })
        .collect())
}
