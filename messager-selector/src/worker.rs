// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! One [`Worker`] per active address, running at most one selection round
//! at a time (§4.5). Owned and scheduled by the [`crate::driver::Selector`];
//! never shared across tasks beyond the `Arc`s it holds.

use std::sync::Arc;

use messager_address::AddressService;
use messager_core::address::Address;
use messager_core::cid::TipsetKey;
use messager_core::message::{Message, MessageState};
use messager_core::rpc::{ChainClient, EstimateMessage, WalletClient};
use messager_core::tipset::Tipset;
use messager_store::repository::message_repo;
use messager_store::{MessageCache, SharedParamsService, SqliteRepository};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::cid_compute;
use crate::config::SelectorConfig;
use crate::error::SelectorResult;
use crate::fee;

pub struct Worker {
    addr: Address,
    repo: Arc<SqliteRepository>,
    cache: Arc<MessageCache>,
    addresses: Arc<AddressService>,
    shared_params: Arc<SharedParamsService>,
    chain: Arc<dyn ChainClient>,
    wallet: Arc<dyn WalletClient>,
    config: Arc<SelectorConfig>,
    publish_tx: mpsc::Sender<Vec<Message>>,
    /// Held for the duration of a round: the Worker itself never runs two
    /// rounds concurrently (§5 ordering guarantees).
    lock: Mutex<()>,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        addr: Address,
        repo: Arc<SqliteRepository>,
        cache: Arc<MessageCache>,
        addresses: Arc<AddressService>,
        shared_params: Arc<SharedParamsService>,
        chain: Arc<dyn ChainClient>,
        wallet: Arc<dyn WalletClient>,
        config: Arc<SelectorConfig>,
        publish_tx: mpsc::Sender<Vec<Message>>,
    ) -> Self {
        Worker {
            addr,
            repo,
            cache,
            addresses,
            shared_params,
            chain,
            wallet,
            config,
            publish_tx,
            lock: Mutex::new(()),
        }
    }

    pub fn addr(&self) -> &Address {
        &self.addr
    }

    /// Runs one selection round against tipset `tip`. Returns `Ok(())` even
    /// when the round produced nothing to push — e.g. back-pressured or no
    /// signer configured — those are not errors.
    pub async fn run_round(&self, tip: &Tipset) -> SelectorResult<()> {
        let _guard = self.lock.lock().await;

        // Step 1: signing principals.
        let signers = self.addresses.get_accounts_of_signer(&self.addr).await?;
        if signers.is_empty() {
            warn!(addr = %self.addr, "no signing principal registered, skipping round");
            return Ok(());
        }

        let mut address_info = self.addresses.get(&self.addr).await?;

        // Step 2-3: reconcile our nonce watermark against the chain.
        let actor = self.chain.state_get_actor(&self.addr, &tip.key).await?;
        let applied_nonce = self.applied_nonce_on_tipset(tip).await?;
        let nonce_in_latest_ts = applied_nonce.max(actor.nonce);
        if address_info.nonce < nonce_in_latest_ts {
            self.addresses.update_nonce(&self.addr, nonce_in_latest_ts).await?;
            address_info.nonce = nonce_in_latest_ts;
        }

        // Step 4: rebroadcast set.
        let to_push_filled =
            message_repo::list_filled_below_nonce(self.repo.pool(), &self.addr, nonce_in_latest_ts)
                .await
                .map_err(crate::error::SelectorError::Store)?;

        // Step 5: back-pressure check.
        let cap = if address_info.sel_msg_num > 0 {
            address_info.sel_msg_num
        } else {
            self.shared_params.get().sel_msg_num
        };
        let gap = address_info.nonce.saturating_sub(nonce_in_latest_ts);
        if gap >= cap {
            info!(addr = %self.addr, gap, cap, "back-pressured, rebroadcasting only");
            self.emit(Vec::new(), to_push_filled).await;
            return Ok(());
        }
        let want = (cap - gap) as usize;

        // Step 6: candidates.
        let fetch_limit = (want * 2).min(self.config.max_candidates_per_round) as i64;
        let candidates =
            message_repo::list_unfilled_oldest_first(self.repo.pool(), &self.addr, fetch_limit)
                .await
                .map_err(crate::error::SelectorError::Store)?;

        // Step 7: fee merge + base-fee deferral.
        let shared = self.shared_params.get();
        let mut eligible = Vec::new();
        for candidate in candidates {
            if fee::is_deferred(candidate.meta.as_ref(), tip.parent_base_fee) {
                continue;
            }
            let resolved = fee::resolve(candidate.meta.as_ref(), &address_info.fee_params, &shared);
            eligible.push((candidate, resolved));
        }

        // Step 8: batch gas estimation.
        let estimate_inputs: Vec<EstimateMessage> = eligible
            .iter()
            .map(|(m, _)| EstimateMessage {
                id: m.id,
                msg: m.unsigned.clone(),
            })
            .collect();
        let estimates = if estimate_inputs.is_empty() {
            Vec::new()
        } else {
            tokio::time::timeout(
                self.config.estimate_message_timeout,
                self.chain
                    .gas_batch_estimate_message_gas(&estimate_inputs, address_info.nonce, &tip.key),
            )
            .await
            .map_err(|_| anyhow::anyhow!("gas_batch_estimate_message_gas timed out"))??
        };

        // Step 9: sequential nonce assignment.
        let mut selected = Vec::new();
        let mut failures = Vec::new();
        let mut sign_failed = false;
        for estimate in estimates {
            if selected.len() >= want || sign_failed {
                break;
            }
            let Some((mut msg, resolved)) = eligible
                .iter()
                .position(|(m, _)| m.id == estimate.id)
                .map(|idx| eligible[idx].clone())
            else {
                continue;
            };
            let gas = match estimate.result {
                Ok(gas) => gas,
                Err(err) => {
                    failures.push((msg.id, err));
                    continue;
                }
            };

            msg.unsigned.nonce = address_info.nonce;
            msg.unsigned.gas_limit = ((gas.gas_limit as f64) * resolved.gas_over_estimation) as i64;
            msg.unsigned.gas_premium = ((gas.gas_premium as f64) * resolved.gas_over_premium) as u128;
            let cap_floor = resolved.gas_fee_cap.max(gas.gas_fee_cap);
            msg.unsigned.gas_fee_cap = if resolved.max_fee > 0 && msg.unsigned.gas_limit > 0 {
                cap_floor.min(resolved.max_fee / msg.unsigned.gas_limit as u128)
            } else {
                cap_floor
            };
            let unsigned_cid = cid_compute::unsigned_cid(&msg.unsigned);

            let digest = unsigned_cid.as_str().as_bytes().to_vec();
            let raw_block = serde_json::to_vec(&msg.unsigned).unwrap_or_default();
            let sign_result = tokio::time::timeout(
                self.config.sign_message_timeout,
                self.wallet.wallet_sign(&self.addr, &signers, &digest, &raw_block),
            )
            .await;

            let signature = match sign_result {
                Ok(Ok(sig)) => sig,
                Ok(Err(e)) => {
                    failures.push((msg.id, e.to_string()));
                    sign_failed = true;
                    break;
                }
                Err(_) => {
                    failures.push((msg.id, "wallet_sign timed out".to_string()));
                    sign_failed = true;
                    break;
                }
            };

            let signed_cid = cid_compute::signed_cid(&msg.unsigned, &signature);
            msg.unsigned_cid = Some(unsigned_cid);
            msg.signed_cid = Some(signed_cid);
            msg.signature = Some(signature);
            msg.state = MessageState::FillMsg;
            address_info.nonce += 1;
            selected.push(msg);
        }

        // Step 10: atomic persist.
        let selected_for_tx = selected.clone();
        let final_nonce = address_info.nonce;
        let failures_for_tx = failures.clone();
        let addr_for_tx = self.addr.clone();
        self.repo
            .transaction(move |tx| {
                messager_store::repository::boxed(async move {
                    messager_store::repository::message_repo::batch_save_messages(
                        tx,
                        &selected_for_tx,
                    )
                    .await?;
                    messager_store::repository::address_repo::update_nonce(
                        &mut **tx,
                        &addr_for_tx,
                        final_nonce,
                    )
                    .await?;
                    for (id, err) in &failures_for_tx {
                        messager_store::repository::message_repo::update_err_msg(&mut **tx, *id, err)
                            .await?;
                    }
                    Ok(())
                })
            })
            .await
            .map_err(crate::error::SelectorError::Store)?;

        for msg in &selected {
            self.cache.set(msg.clone());
        }

        self.emit(selected, to_push_filled).await;
        Ok(())
    }

    async fn emit(&self, selected: Vec<Message>, rebroadcast: Vec<Message>) {
        let mut batch = selected;
        batch.extend(rebroadcast);
        if batch.is_empty() {
            return;
        }
        batch.sort_by_key(|m| m.nonce());
        if self.publish_tx.try_send(batch).is_err() {
            warn!(addr = %self.addr, "publisher channel full, dropping round's batch");
        }
    }

    /// Scans the tipset's applied messages for this address's highest
    /// observed nonce, used alongside `StateGetActor` in step 2.
    async fn applied_nonce_on_tipset(&self, tip: &Tipset) -> SelectorResult<u64> {
        let msgs = self.chain.chain_get_messages_in_tipset(&tip.key).await?;
        Ok(msgs
            .iter()
            .filter(|m| m.from == self.addr)
            .map(|m| m.nonce + 1)
            .max()
            .unwrap_or(0))
    }
}
