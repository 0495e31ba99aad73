// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use messager_core::shared_params::SharedParams;

use crate::error::StoreResult;
use crate::repository::row::SharedParamsRow;

/// Replaces the singleton row atomically. There is always exactly one row
/// (`id = 1`); the first call creates it.
pub async fn set_shared_params<'e, E>(exec: E, params: &SharedParams) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO shared_params (id, sel_msg_num, gas_over_estimation, gas_over_premium, max_fee, \
            gas_fee_cap, base_fee) VALUES (1, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET \
            sel_msg_num = excluded.sel_msg_num, gas_over_estimation = excluded.gas_over_estimation, \
            gas_over_premium = excluded.gas_over_premium, max_fee = excluded.max_fee, \
            gas_fee_cap = excluded.gas_fee_cap, base_fee = excluded.base_fee",
    )
    .bind(params.sel_msg_num as i64)
    .bind(params.gas_over_estimation)
    .bind(params.gas_over_premium)
    .bind(params.max_fee.to_string())
    .bind(params.gas_fee_cap.to_string())
    .bind(params.base_fee.to_string())
    .execute(exec)
    .await?;
    Ok(())
}

/// Returns the default [`SharedParams`] if the row has never been written.
pub async fn get_shared_params<'e, E>(exec: E) -> StoreResult<SharedParams>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let row: Option<SharedParamsRow> = sqlx::query_as(
        "SELECT sel_msg_num, gas_over_estimation, gas_over_premium, max_fee, gas_fee_cap, base_fee \
         FROM shared_params WHERE id = 1",
    )
    .fetch_optional(exec)
    .await?;
    match row {
        Some(row) => row.into_shared_params(),
        None => Ok(SharedParams::default()),
    }
}
