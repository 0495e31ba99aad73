// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! StateRefresher (§4.8): applies HeadTracker's resolved apply/revert
//! batches to persisted message rows, detects out-of-band replacements, and
//! mirrors the transitions into the [`MessageCache`].

use std::sync::Arc;

use messager_address::AddressService;
use messager_core::cid::MsgCid;
use messager_core::message::MessageState;
use messager_core::rpc::ChainClient;
use messager_core::tipset::Tipset;
use messager_store::repository::message_repo;
use messager_store::{MessageCache, SqliteRepository};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, warn, Instrument};

use crate::error::{HeadTrackerError, HeadTrackerResult};
use crate::tracker::ResolvedHeadChange;

#[derive(Clone)]
pub struct StateRefresher {
    repo: Arc<SqliteRepository>,
    cache: Arc<MessageCache>,
    addresses: Arc<AddressService>,
    chain: Arc<dyn ChainClient>,
}

impl StateRefresher {
    pub fn new(
        repo: Arc<SqliteRepository>,
        cache: Arc<MessageCache>,
        addresses: Arc<AddressService>,
        chain: Arc<dyn ChainClient>,
    ) -> Self {
        StateRefresher {
            repo,
            cache,
            addresses,
            chain,
        }
    }

    pub async fn run(self, mut rx: mpsc::Receiver<ResolvedHeadChange>, cancel: CancellationToken) {
        loop {
            let change = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                change = rx.recv() => change,
            };
            let Some(change) = change else { break };
            let span = info_span!("staterefresher.batch", reconnect = change.reconnect);
            if let Err(e) = self.process(change).instrument(span).await {
                warn!(error = %e, "failed to process head-tracker batch");
            }
        }
    }

    /// Applies one resolved batch: visible outside the crate so the state
    /// refresher can be driven directly in tests without a channel.
    pub async fn process(&self, change: ResolvedHeadChange) -> HeadTrackerResult<()> {
        if change.reconnect {
            return self.update_all_filled_messages().await;
        }

        let managed: std::collections::HashSet<_> = self
            .addresses
            .list_active_address()
            .await
            .map_err(|e| HeadTrackerError::Other(e.into()))?
            .into_iter()
            .map(|a| a.addr)
            .collect();

        // Step 1: revert set.
        let mut revert_cids = Vec::new();
        for height in &change.revert_heights {
            let rows = message_repo::list_onchain_by_height(self.repo.pool(), *height)
                .await
                .map_err(HeadTrackerError::Store)?;
            for row in rows {
                if managed.contains(row.from()) {
                    if let Some(cid) = row.signed_cid.clone() {
                        revert_cids.push(cid);
                    }
                }
            }
        }

        // Step 2: apply set.
        let mut applied = Vec::new();
        for tip in &change.apply {
            for cid in tip.key.cids() {
                let msgs = self.chain.chain_get_parent_messages(cid).await?;
                let receipts = self.chain.chain_get_parent_receipts(cid).await?;
                if msgs.len() != receipts.len() {
                    return Err(HeadTrackerError::InternalInvariantViolation {
                        messages: msgs.len(),
                        receipts: receipts.len(),
                    });
                }
                for ((msg_cid, unsigned), receipt) in msgs.into_iter().zip(receipts) {
                    if managed.contains(&unsigned.from) {
                        applied.push((msg_cid, unsigned, tip.clone(), receipt));
                    }
                }
            }
        }

        let remaining_revert_cids = self.apply_transaction(revert_cids, applied.clone()).await?;

        for (cid, _, tip, _receipt) in &applied {
            if let Ok(Some(row)) = message_repo::get_by_signed_cid(self.repo.pool(), cid).await {
                self.cache
                    .mutate(row.id, |m| {
                        m.state = MessageState::OnChainMsg;
                        m.height = tip.height;
                    })
                    .await
                    .ok();
            }
        }
        for cid in &remaining_revert_cids {
            if let Ok(Some(row)) = message_repo::get_by_signed_cid(self.repo.pool(), cid).await {
                self.cache
                    .mutate(row.id, |m| m.state = MessageState::FillMsg)
                    .await
                    .ok();
            }
        }

        Ok(())
    }

    async fn apply_transaction(
        &self,
        revert_cids: Vec<MsgCid>,
        applied: Vec<(MsgCid, messager_core::message::UnsignedMessage, Tipset, messager_core::message::Receipt)>,
    ) -> HeadTrackerResult<Vec<MsgCid>> {
        let remaining_revert: std::collections::HashSet<MsgCid> = revert_cids.into_iter().collect();

        self.repo
            .transaction(move |tx| {
                let mut remaining_revert = remaining_revert;
                let applied = applied.clone();
                messager_store::repository::boxed(async move {
                    for (msg_cid, unsigned, tip, receipt) in applied {
                        let existing = messager_store::repository::message_repo::get_by_from_nonce(
                            &mut **tx,
                            &unsigned.from,
                            unsigned.nonce,
                        )
                        .await?;

                        let tipset_str = Some(tip.key.to_string());
                        match existing {
                            Some(row) if row.signed_cid.as_ref() != Some(&msg_cid) => {
                                // A replacement happened outside this system.
                                let mut replaced = row.clone();
                                replaced.signed_cid = Some(msg_cid.clone());
                                replaced.state = MessageState::ReplacedMsg;
                                replaced.height = tip.height;
                                replaced.receipt = Some(receipt.clone());
                                replaced.tipset_key = Some(tip.key.clone());
                                messager_store::repository::message_repo::save_message(&mut **tx, &replaced)
                                    .await?;
                            }
                            Some(row) => {
                                messager_store::repository::message_repo::update_message_info_by_cid(
                                    &mut **tx,
                                    &msg_cid,
                                    receipt.exit_code,
                                    &receipt.return_value,
                                    receipt.gas_used,
                                    tip.height,
                                    MessageState::OnChainMsg,
                                    tipset_str,
                                )
                                .await?;
                                remaining_revert.remove(&msg_cid);
                                let _ = row;
                            }
                            None => {}
                        }
                    }

                    for cid in remaining_revert.iter() {
                        messager_store::repository::message_repo::update_message_info_by_cid(
                            &mut **tx,
                            cid,
                            -1,
                            &[],
                            0,
                            0,
                            MessageState::FillMsg,
                            None,
                        )
                        .await?;
                    }

                    Ok(remaining_revert.iter().cloned().collect::<Vec<_>>())
                })
            })
            .await
            .map_err(HeadTrackerError::Store)
    }

    /// `UpdateAllFilledMessage`: the full-resync path triggered when a
    /// reorg exceeds `LookBackLimit` or a reconnect can't be reconciled
    /// incrementally (§4.8).
    async fn update_all_filled_messages(&self) -> HeadTrackerResult<()> {
        let addresses = self
            .addresses
            .list_active_address()
            .await
            .map_err(|e| HeadTrackerError::Other(e.into()))?;

        for addr_info in addresses {
            let rows = message_repo::list_filled_by_address(self.repo.pool(), &addr_info.addr)
                .await
                .map_err(HeadTrackerError::Store)?;
            for row in rows {
                let Some(signed_cid) = row.signed_cid.clone() else { continue };
                if let Some((receipt, height, tipset_key)) = self.chain.state_search_msg(&signed_cid).await? {
                    message_repo::update_message_info_by_cid(
                        self.repo.pool(),
                        &signed_cid,
                        receipt.exit_code,
                        &receipt.return_value,
                        receipt.gas_used,
                        height,
                        MessageState::OnChainMsg,
                        Some(tipset_key.to_string()),
                    )
                    .await
                    .map_err(HeadTrackerError::Store)?;
                    self.cache
                        .mutate(row.id, |m| {
                            m.state = MessageState::OnChainMsg;
                            m.height = height;
                        })
                        .await
                        .ok();
                }
            }
        }
        Ok(())
    }
}
