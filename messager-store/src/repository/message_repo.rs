// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use chrono::{DateTime, Duration, Utc};
use messager_core::address::Address;
use messager_core::cid::MsgCid;
use messager_core::message::{Message, MessageState};
use sqlx::Sqlite;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::repository::row::{MessageFields, MessageRow};

pub enum SortOrder {
    Asc,
    Desc,
}

const SELECT_COLUMNS: &str = "id, from_addr, to_addr, nonce, value, gas_limit, gas_fee_cap, gas_premium, \
    method, params, signature_type, signature_bytes, unsigned_cid, signed_cid, height, tipset_key, \
    exit_code, return_value, gas_used, state, meta, from_user, wallet_name, error_msg, estimate_failures, \
    created_at, updated_at";

/// `CreateMessage`: fails with [`StoreError::DuplicateMessageId`] if the id
/// already exists, satisfying the idempotent-push law in SPEC_FULL.md §8.
pub async fn create_message<'e, E>(exec: E, msg: &Message) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let f = MessageFields::from_message(msg)?;
    let result = sqlx::query(&format!(
        "INSERT INTO messages ({SELECT_COLUMNS}) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)"
    ))
    .bind(&f.id)
    .bind(f.from_addr)
    .bind(f.to_addr)
    .bind(f.nonce)
    .bind(&f.value)
    .bind(f.gas_limit)
    .bind(&f.gas_fee_cap)
    .bind(&f.gas_premium)
    .bind(f.method)
    .bind(f.params)
    .bind(f.signature_type)
    .bind(f.signature_bytes)
    .bind(f.unsigned_cid)
    .bind(f.signed_cid)
    .bind(f.height)
    .bind(f.tipset_key)
    .bind(f.exit_code)
    .bind(f.return_value)
    .bind(f.gas_used)
    .bind(f.state)
    .bind(f.meta)
    .bind(f.from_user)
    .bind(f.wallet_name)
    .bind(f.error_msg)
    .bind(f.estimate_failures)
    .bind(f.created_at)
    .bind(f.updated_at)
    .execute(exec)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(StoreError::DuplicateMessageId(msg.id.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// `SaveMessage`: upsert that preserves `created_at` and advances
/// `updated_at`, per SPEC_FULL.md §8's "SaveMessage preserves created_at" law.
pub async fn save_message<'e, E>(exec: E, msg: &Message) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let f = MessageFields::from_message(msg)?;
    sqlx::query(
        "INSERT INTO messages (id, from_addr, to_addr, nonce, value, gas_limit, gas_fee_cap, gas_premium, \
            method, params, signature_type, signature_bytes, unsigned_cid, signed_cid, height, tipset_key, \
            exit_code, return_value, gas_used, state, meta, from_user, wallet_name, error_msg, \
            estimate_failures, created_at, updated_at) \
         VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?) \
         ON CONFLICT(id) DO UPDATE SET \
            from_addr=excluded.from_addr, to_addr=excluded.to_addr, nonce=excluded.nonce, \
            value=excluded.value, gas_limit=excluded.gas_limit, gas_fee_cap=excluded.gas_fee_cap, \
            gas_premium=excluded.gas_premium, method=excluded.method, params=excluded.params, \
            signature_type=excluded.signature_type, signature_bytes=excluded.signature_bytes, \
            unsigned_cid=excluded.unsigned_cid, signed_cid=excluded.signed_cid, height=excluded.height, \
            tipset_key=excluded.tipset_key, exit_code=excluded.exit_code, return_value=excluded.return_value, \
            gas_used=excluded.gas_used, state=excluded.state, meta=excluded.meta, from_user=excluded.from_user, \
            wallet_name=excluded.wallet_name, error_msg=excluded.error_msg, \
            estimate_failures=excluded.estimate_failures, updated_at=excluded.updated_at",
    )
    .bind(&f.id)
    .bind(f.from_addr)
    .bind(f.to_addr)
    .bind(f.nonce)
    .bind(&f.value)
    .bind(f.gas_limit)
    .bind(&f.gas_fee_cap)
    .bind(&f.gas_premium)
    .bind(f.method)
    .bind(f.params)
    .bind(f.signature_type)
    .bind(f.signature_bytes)
    .bind(f.unsigned_cid)
    .bind(f.signed_cid)
    .bind(f.height)
    .bind(f.tipset_key)
    .bind(f.exit_code)
    .bind(f.return_value)
    .bind(f.gas_used)
    .bind(f.state)
    .bind(f.meta)
    .bind(f.from_user)
    .bind(f.wallet_name)
    .bind(f.error_msg)
    .bind(f.estimate_failures)
    .bind(f.created_at)
    .bind(f.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

/// `BatchSaveMessage`: used by the selector to persist a whole round's
/// worth of newly-filled messages inside a single transaction.
pub async fn batch_save_messages(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    msgs: &[Message],
) -> StoreResult<()> {
    for m in msgs {
        save_message(&mut **tx, m).await?;
    }
    Ok(())
}

pub async fn get_by_id<'e, E>(exec: E, id: Uuid) -> StoreResult<Option<Message>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let row: Option<MessageRow> =
        sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM messages WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(exec)
            .await?;
    row.map(MessageRow::into_message).transpose()
}

pub async fn get_by_unsigned_cid<'e, E>(exec: E, cid: &MsgCid) -> StoreResult<Option<Message>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let row: Option<MessageRow> =
        sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM messages WHERE unsigned_cid = ?"))
            .bind(cid.as_str())
            .fetch_optional(exec)
            .await?;
    row.map(MessageRow::into_message).transpose()
}

pub async fn get_by_signed_cid<'e, E>(exec: E, cid: &MsgCid) -> StoreResult<Option<Message>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let row: Option<MessageRow> =
        sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM messages WHERE signed_cid = ?"))
            .bind(cid.as_str())
            .fetch_optional(exec)
            .await?;
    row.map(MessageRow::into_message).transpose()
}

pub async fn get_by_from_nonce<'e, E>(exec: E, from: &Address, nonce: u64) -> StoreResult<Option<Message>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let row: Option<MessageRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM messages WHERE from_addr = ? AND nonce = ?"
    ))
    .bind(from.as_str())
    .bind(nonce as i64)
    .fetch_optional(exec)
    .await?;
    row.map(MessageRow::into_message).transpose()
}

fn state_str(state: MessageState) -> &'static str {
    match state {
        MessageState::UnFillMsg => "UnFillMsg",
        MessageState::FillMsg => "FillMsg",
        MessageState::OnChainMsg => "OnChainMsg",
        MessageState::FailedMsg => "FailedMsg",
        MessageState::NoWalletMsg => "NoWalletMsg",
        MessageState::ReplacedMsg => "ReplacedMsg",
    }
}

pub async fn get_by_from_nonce_state<'e, E>(
    exec: E,
    from: &Address,
    nonce: u64,
    state: MessageState,
) -> StoreResult<Option<Message>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let row: Option<MessageRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM messages WHERE from_addr = ? AND nonce = ? AND state = ?"
    ))
    .bind(from.as_str())
    .bind(nonce as i64)
    .bind(state_str(state))
    .fetch_optional(exec)
    .await?;
    row.map(MessageRow::into_message).transpose()
}

/// Oldest-first UnFill candidates for one address, capped at `limit` rows.
/// The selector uses this with `limit = min(want*2, 100)` (§4.5 step 6).
pub async fn list_unfilled_oldest_first<'e, E>(
    exec: E,
    from: &Address,
    limit: i64,
) -> StoreResult<Vec<Message>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let rows: Vec<MessageRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM messages WHERE from_addr = ? AND state = ? \
         ORDER BY created_at ASC LIMIT ?"
    ))
    .bind(from.as_str())
    .bind(state_str(MessageState::UnFillMsg))
    .bind(limit)
    .fetch_all(exec)
    .await?;
    rows.into_iter().map(MessageRow::into_message).collect()
}

pub async fn list_by_from_state_paged<'e, E>(
    exec: E,
    from: &Address,
    state: MessageState,
    order: SortOrder,
    page_index: i64,
    page_size: i64,
) -> StoreResult<Vec<Message>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let dir = match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    let rows: Vec<MessageRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM messages WHERE from_addr = ? AND state = ? \
         ORDER BY created_at {dir} LIMIT ? OFFSET ?"
    ))
    .bind(from.as_str())
    .bind(state_str(state))
    .bind(page_size)
    .bind(page_index * page_size)
    .fetch_all(exec)
    .await?;
    rows.into_iter().map(MessageRow::into_message).collect()
}

/// `ListOnChainMessageByHeight`: confirmed messages at a given height,
/// the set the state refresher rolls back to `FillMsg` on revert.
pub async fn list_onchain_by_height<'e, E>(exec: E, height: i64) -> StoreResult<Vec<Message>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let rows: Vec<MessageRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM messages WHERE height = ? AND state = ?"
    ))
    .bind(height)
    .bind(state_str(MessageState::OnChainMsg))
    .fetch_all(exec)
    .await?;
    rows.into_iter().map(MessageRow::into_message).collect()
}

/// `ListFilledMessageByAddress`.
pub async fn list_filled_by_address<'e, E>(exec: E, from: &Address) -> StoreResult<Vec<Message>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let rows: Vec<MessageRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM messages WHERE from_addr = ? AND state = ? ORDER BY nonce ASC"
    ))
    .bind(from.as_str())
    .bind(state_str(MessageState::FillMsg))
    .fetch_all(exec)
    .await?;
    rows.into_iter().map(MessageRow::into_message).collect()
}

/// `ListFilledMessageBelowNonce`: FillMsg rows with `nonce >= nonce_floor`,
/// i.e. below the address's own assigned-nonce watermark — the rebroadcast
/// set used in §4.5 step 4.
pub async fn list_filled_below_nonce<'e, E>(
    exec: E,
    from: &Address,
    nonce_floor: u64,
) -> StoreResult<Vec<Message>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let rows: Vec<MessageRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM messages WHERE from_addr = ? AND state = ? AND nonce >= ? \
         ORDER BY nonce ASC"
    ))
    .bind(from.as_str())
    .bind(state_str(MessageState::FillMsg))
    .bind(nonce_floor as i64)
    .fetch_all(exec)
    .await?;
    rows.into_iter().map(MessageRow::into_message).collect()
}

/// `ListBlockedMessage`: messages in {UnFill, Fill} older than `now - min_age`.
pub async fn list_blocked<'e, E>(
    exec: E,
    from: Option<&Address>,
    min_age: Duration,
) -> StoreResult<Vec<Message>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let cutoff: DateTime<Utc> = Utc::now() - min_age;
    let rows: Vec<MessageRow> = if let Some(addr) = from {
        sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM messages WHERE from_addr = ? AND state IN (?, ?) AND created_at < ?"
        ))
        .bind(addr.as_str())
        .bind(state_str(MessageState::UnFillMsg))
        .bind(state_str(MessageState::FillMsg))
        .bind(cutoff)
        .fetch_all(exec)
        .await?
    } else {
        sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM messages WHERE state IN (?, ?) AND created_at < ?"
        ))
        .bind(state_str(MessageState::UnFillMsg))
        .bind(state_str(MessageState::FillMsg))
        .bind(cutoff)
        .fetch_all(exec)
        .await?
    };
    rows.into_iter().map(MessageRow::into_message).collect()
}

/// `ListFailedMessage`.
pub async fn list_failed<'e, E>(exec: E, from: Option<&Address>) -> StoreResult<Vec<Message>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let rows: Vec<MessageRow> = if let Some(addr) = from {
        sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM messages WHERE from_addr = ? AND state = ?"
        ))
        .bind(addr.as_str())
        .bind(state_str(MessageState::FailedMsg))
        .fetch_all(exec)
        .await?
    } else {
        sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM messages WHERE state = ?"))
            .bind(state_str(MessageState::FailedMsg))
            .fetch_all(exec)
            .await?
    };
    rows.into_iter().map(MessageRow::into_message).collect()
}

pub async fn update_state_by_id<'e, E>(exec: E, id: Uuid, state: MessageState) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query("UPDATE messages SET state = ?, updated_at = ? WHERE id = ?")
        .bind(state_str(state))
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn update_state_by_cid<'e, E>(exec: E, cid: &MsgCid, state: MessageState) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query("UPDATE messages SET state = ?, updated_at = ? WHERE signed_cid = ? OR unsigned_cid = ?")
        .bind(state_str(state))
        .bind(Utc::now())
        .bind(cid.as_str())
        .bind(cid.as_str())
        .execute(exec)
        .await?;
    Ok(())
}

/// `UpdateMessageInfoByCid`: writes the receipt/height/tipset/state tuple
/// observed for a message on either the apply or revert path (§4.8 step 3).
pub async fn update_message_info_by_cid<'e, E>(
    exec: E,
    cid: &MsgCid,
    exit_code: i64,
    return_value: &[u8],
    gas_used: i64,
    height: i64,
    state: MessageState,
    tipset_key: Option<String>,
) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE messages SET exit_code = ?, return_value = ?, gas_used = ?, height = ?, state = ?, \
         tipset_key = ?, updated_at = ? WHERE signed_cid = ?",
    )
    .bind(exit_code)
    .bind(return_value)
    .bind(gas_used)
    .bind(height)
    .bind(state_str(state))
    .bind(tipset_key)
    .bind(Utc::now())
    .bind(cid.as_str())
    .execute(exec)
    .await?;
    Ok(())
}

/// `ExpireMessage`: moves the named ids straight to `FailedMsg`.
pub async fn expire_messages(pool: &sqlx::SqlitePool, ids: &[Uuid]) -> StoreResult<()> {
    for id in ids {
        update_state_by_id(pool, *id, MessageState::FailedMsg).await?;
    }
    Ok(())
}

/// `MarkBadMessage`: admin override straight to `FailedMsg` with a reason.
pub async fn mark_bad_message<'e, E>(exec: E, id: Uuid, reason: &str) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query("UPDATE messages SET state = ?, error_msg = ?, updated_at = ? WHERE id = ?")
        .bind(state_str(MessageState::FailedMsg))
        .bind(reason)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn update_err_msg<'e, E>(exec: E, id: Uuid, err: &str) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE messages SET error_msg = ?, estimate_failures = estimate_failures + 1, updated_at = ? \
         WHERE id = ?",
    )
    .bind(err)
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(exec)
    .await?;
    Ok(())
}
