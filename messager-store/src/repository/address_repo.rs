// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use chrono::Utc;
use messager_core::address::Address;
use messager_core::address_info::{AddressInfo, AddressState, FeeParams};

use crate::error::{StoreError, StoreResult};
use crate::repository::row::{address_state_str, AddressRow};

const SELECT_COLUMNS: &str = "addr, nonce, state, sel_msg_num, gas_over_estimation, gas_over_premium, \
    max_fee, gas_fee_cap, base_fee, created_at, updated_at";

/// `SaveAddress`: fails if the address already exists.
pub async fn save_address<'e, E>(exec: E, info: &AddressInfo) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO addresses (addr, nonce, state, sel_msg_num, gas_over_estimation, gas_over_premium, \
            max_fee, gas_fee_cap, base_fee, created_at, updated_at) VALUES (?,?,?,?,?,?,?,?,?,?,?)",
    )
    .bind(info.addr.as_str())
    .bind(info.nonce as i64)
    .bind(address_state_str(info.state))
    .bind(info.sel_msg_num as i64)
    .bind(info.fee_params.gas_over_estimation)
    .bind(info.fee_params.gas_over_premium)
    .bind(info.fee_params.max_fee.map(|v| v.to_string()))
    .bind(info.fee_params.gas_fee_cap.map(|v| v.to_string()))
    .bind(info.fee_params.base_fee.map(|v| v.to_string()))
    .bind(info.created_at)
    .bind(info.updated_at)
    .execute(exec)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(StoreError::DuplicateAddress(info.addr.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn get_address<'e, E>(exec: E, addr: &Address) -> StoreResult<Option<AddressInfo>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let row: Option<AddressRow> =
        sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM addresses WHERE addr = ?"))
            .bind(addr.as_str())
            .fetch_optional(exec)
            .await?;
    row.map(AddressRow::into_address_info).transpose()
}

pub async fn list_active_addresses<'e, E>(exec: E) -> StoreResult<Vec<AddressInfo>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let rows: Vec<AddressRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM addresses WHERE state = ?"
    ))
    .bind(address_state_str(AddressState::Alive))
    .fetch_all(exec)
    .await?;
    rows.into_iter().map(AddressRow::into_address_info).collect()
}

pub async fn list_all_addresses<'e, E>(exec: E) -> StoreResult<Vec<AddressInfo>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let rows: Vec<AddressRow> = sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM addresses"))
        .fetch_all(exec)
        .await?;
    rows.into_iter().map(AddressRow::into_address_info).collect()
}

fn require_affected(rows_affected: u64, addr: &Address) -> StoreResult<()> {
    if rows_affected == 0 {
        Err(StoreError::AddressNotFound(addr.to_string()))
    } else {
        Ok(())
    }
}

/// `UpdateNonce`: never allowed to move the nonce backwards (§3 invariant).
pub async fn update_nonce<'e, E>(exec: E, addr: &Address, nonce: u64) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE addresses SET nonce = MAX(nonce, ?), updated_at = ? WHERE addr = ?")
        .bind(nonce as i64)
        .bind(Utc::now())
        .bind(addr.as_str())
        .execute(exec)
        .await?;
    require_affected(result.rows_affected(), addr)
}

pub async fn update_state<'e, E>(exec: E, addr: &Address, state: AddressState) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE addresses SET state = ?, updated_at = ? WHERE addr = ?")
        .bind(address_state_str(state))
        .bind(Utc::now())
        .bind(addr.as_str())
        .execute(exec)
        .await?;
    require_affected(result.rows_affected(), addr)
}

pub async fn set_select_msg_num<'e, E>(exec: E, addr: &Address, sel_msg_num: u64) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE addresses SET sel_msg_num = ?, updated_at = ? WHERE addr = ?")
        .bind(sel_msg_num as i64)
        .bind(Utc::now())
        .bind(addr.as_str())
        .execute(exec)
        .await?;
    require_affected(result.rows_affected(), addr)
}

/// `SetFeeParams`: a `None` field is left untouched; a request with every
/// field `None` is a no-op.
pub async fn set_fee_params<'e, E>(exec: E, addr: &Address, fee: &FeeParams) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE addresses SET \
            gas_over_estimation = COALESCE(?, gas_over_estimation), \
            gas_over_premium = COALESCE(?, gas_over_premium), \
            max_fee = COALESCE(?, max_fee), \
            gas_fee_cap = COALESCE(?, gas_fee_cap), \
            base_fee = COALESCE(?, base_fee), \
            updated_at = ? \
         WHERE addr = ?",
    )
    .bind(fee.gas_over_estimation)
    .bind(fee.gas_over_premium)
    .bind(fee.max_fee.map(|v| v.to_string()))
    .bind(fee.gas_fee_cap.map(|v| v.to_string()))
    .bind(fee.base_fee.map(|v| v.to_string()))
    .bind(Utc::now())
    .bind(addr.as_str())
    .execute(exec)
    .await?;
    require_affected(result.rows_affected(), addr)
}

/// Explicit delete; tombstoned by marking `Removed` rather than deleting the
/// row, preserving history for audits.
pub async fn remove_address<'e, E>(exec: E, addr: &Address) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE addresses SET state = ?, updated_at = ? WHERE addr = ?")
        .bind(address_state_str(AddressState::Removed))
        .bind(Utc::now())
        .bind(addr.as_str())
        .execute(exec)
        .await?;
    require_affected(result.rows_affected(), addr)
}
