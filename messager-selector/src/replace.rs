// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Manual/auto fee-bump replacement of a pending message (§4.9).

use std::sync::Arc;

use messager_core::cid::TipsetKey;
use messager_core::message::{Message, MessageState};
use messager_core::rpc::{ChainClient, EstimateMessage, WalletClient};
use messager_store::repository::message_repo;
use messager_store::SqliteRepository;
use uuid::Uuid;

use crate::cid_compute;
use crate::error::{SelectorError, SelectorResult};

/// Minimum premium bump multiplier for an auto-replace RBF, expressed as a
/// percentage increase over the current premium.
const MIN_RBF_BUMP_PERCENT: u128 = 25;

pub struct ReplaceRequest {
    pub id: Uuid,
    pub auto: bool,
    pub max_fee: Option<u128>,
    pub gas_limit: Option<i64>,
    pub gas_premium: Option<u128>,
    pub gas_fee_cap: Option<u128>,
}

fn compute_min_rbf(current_premium: u128) -> u128 {
    current_premium + (current_premium * MIN_RBF_BUMP_PERCENT) / 100
}

pub async fn replace(
    repo: &Arc<SqliteRepository>,
    chain: &Arc<dyn ChainClient>,
    wallet: &Arc<dyn WalletClient>,
    signers: &[String],
    tip_key: &TipsetKey,
    req: ReplaceRequest,
) -> SelectorResult<Message> {
    let mut msg = message_repo::get_by_id(repo.pool(), req.id)
        .await?
        .ok_or(SelectorError::MessageNotFound(req.id))?;

    if msg.state == MessageState::OnChainMsg {
        return Err(SelectorError::AlreadyOnChain(req.id));
    }

    if req.auto {
        let min_rbf = compute_min_rbf(msg.unsigned.gas_premium);
        let estimate = chain
            .gas_batch_estimate_message_gas(
                &[EstimateMessage {
                    id: msg.id,
                    msg: msg.unsigned.clone(),
                }],
                msg.unsigned.nonce,
                tip_key,
            )
            .await?
            .into_iter()
            .next()
            .and_then(|r| r.result.ok());

        let estimated_premium = estimate.as_ref().map(|g| g.gas_premium).unwrap_or(msg.unsigned.gas_premium);
        msg.unsigned.gas_premium = estimated_premium.max(min_rbf);
        let estimated_cap = estimate.as_ref().map(|g| g.gas_fee_cap).unwrap_or(msg.unsigned.gas_fee_cap);
        msg.unsigned.gas_fee_cap = estimated_cap.max(msg.unsigned.gas_premium);
        if let Some(gas_limit) = estimate.as_ref().map(|g| g.gas_limit) {
            msg.unsigned.gas_limit = gas_limit;
        }
        if let Some(max_fee) = req.max_fee {
            let cap_ceiling = if msg.unsigned.gas_limit > 0 {
                max_fee / msg.unsigned.gas_limit as u128
            } else {
                max_fee
            };
            msg.unsigned.gas_fee_cap = msg.unsigned.gas_fee_cap.min(cap_ceiling);
        }
    } else {
        if let Some(v) = req.gas_limit {
            msg.unsigned.gas_limit = v;
        }
        if let Some(v) = req.gas_premium {
            msg.unsigned.gas_premium = v;
        }
        if let Some(v) = req.gas_fee_cap {
            msg.unsigned.gas_fee_cap = v;
        }
    }

    let unsigned_cid = cid_compute::unsigned_cid(&msg.unsigned);
    let digest = unsigned_cid.as_str().as_bytes().to_vec();
    let raw_block = serde_json::to_vec(&msg.unsigned).unwrap_or_default();
    let signature = wallet
        .wallet_sign(msg.from(), signers, &digest, &raw_block)
        .await
        .map_err(|e| SelectorError::SignFailed(e.to_string()))?;
    let signed_cid = cid_compute::signed_cid(&msg.unsigned, &signature);

    msg.unsigned_cid = Some(unsigned_cid);
    msg.signed_cid = Some(signed_cid);
    msg.signature = Some(signature);
    msg.state = MessageState::FillMsg;

    message_repo::save_message(repo.pool(), &msg).await?;

    let wire = messager_core::rpc::SignedMessageWire::try_from(&msg)
        .map_err(|e| SelectorError::Other(anyhow::anyhow!(e)))?;
    chain.mpool_push(&wire).await?;

    Ok(msg)
}
