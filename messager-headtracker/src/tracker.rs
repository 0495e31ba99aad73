// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! HeadTracker (§4.7): reconciles the chain node's apply/revert stream
//! against the persisted head log, forwards resolved batches to the
//! StateRefresher, and debounces a "stable head" trigger to the Selector.

use std::sync::Arc;

use messager_core::rpc::ChainClient;
use messager_core::tipset::{ChainEpoch, HeadChange, Tipset};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::HeadTrackerConfig;
use crate::error::HeadTrackerResult;
use crate::gap;
use crate::headlog::HeadLog;

/// A batch of fully-resolved apply/revert heights handed to the
/// StateRefresher. `reconnect` marks the full-resync path (§4.8
/// `UpdateAllFilledMessage`) rather than an incremental update.
#[derive(Clone, Debug)]
pub struct ResolvedHeadChange {
    pub apply: Vec<Tipset>,
    pub revert_heights: Vec<ChainEpoch>,
    pub reconnect: bool,
}

pub struct HeadTracker {
    chain: Arc<dyn ChainClient>,
    config: Arc<HeadTrackerConfig>,
    head_log: Mutex<HeadLog>,
    refresher_tx: mpsc::Sender<ResolvedHeadChange>,
    selector_trigger_tx: mpsc::Sender<Tipset>,
    debounce: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl HeadTracker {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        config: Arc<HeadTrackerConfig>,
        refresher_tx: mpsc::Sender<ResolvedHeadChange>,
        selector_trigger_tx: mpsc::Sender<Tipset>,
    ) -> anyhow::Result<Self> {
        let head_log = HeadLog::load(&config.head_log_path, config.max_store_tipset_count)?;
        Ok(HeadTracker {
            chain,
            config,
            head_log: Mutex::new(head_log),
            refresher_tx,
            selector_trigger_tx,
            debounce: Mutex::new(None),
        })
    }

    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
        let mut rx = self.chain.chain_notify().await?;
        loop {
            let change = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                change = rx.recv() => change,
            };
            match change {
                Some(change) => {
                    if let Err(e) = self.process(change, false).await {
                        warn!(error = %e, "failed to process head change");
                    }
                }
                None => {
                    // The node dropped the stream; treat it as a reconnect.
                    if let Err(e) = self.handle_reconnect().await {
                        warn!(error = %e, "reconnect handling failed");
                    }
                    match self.chain.chain_notify().await {
                        Ok(new_rx) => rx = new_rx,
                        Err(e) => {
                            warn!(error = %e, "could not resubscribe to chain_notify");
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn process(&self, change: HeadChange, reconnect_driven: bool) -> HeadTrackerResult<()> {
        let local = {
            let log = self.head_log.lock().await;
            log.entries()
        };

        let resolution = match gap::resolve(&self.chain, &local, change.apply, self.config.look_back_limit).await
        {
            Ok(r) => r,
            Err(crate::error::HeadTrackerError::ReorgGapExceeded { found, limit }) => {
                warn!(found, limit, "reorg exceeds look-back limit, forcing full resync");
                self.refresher_tx
                    .send(ResolvedHeadChange {
                        apply: Vec::new(),
                        revert_heights: Vec::new(),
                        reconnect: true,
                    })
                    .await
                    .ok();
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let mut revert_heights: Vec<ChainEpoch> =
            resolution.revert.iter().map(|r| r.height).collect();
        revert_heights.extend(change.revert.iter().map(|t| t.height));

        {
            let mut log = self.head_log.lock().await;
            log.remove(&revert_heights);
            log.append(&resolution.apply.iter().map(Tipset::key_height).collect::<Vec<_>>());
            log.persist()?;
        }

        let newest = resolution.apply.first().cloned();

        self.refresher_tx
            .send(ResolvedHeadChange {
                apply: resolution.apply,
                revert_heights,
                reconnect: reconnect_driven,
            })
            .await
            .ok();

        if !reconnect_driven {
            if let Some(tip) = newest {
                self.schedule_trigger(tip).await;
            }
        }

        Ok(())
    }

    /// On chain-node reconnect: re-read the head, compare against the
    /// persisted log, and escalate to a full resync if the gap exceeds
    /// `LookBackLimit` (§4.7 "Reconnect").
    async fn handle_reconnect(&self) -> anyhow::Result<()> {
        let head = self.chain.chain_head().await?;
        let local = {
            let log = self.head_log.lock().await;
            log.entries()
        };
        match gap::resolve(&self.chain, &local, vec![head], self.config.look_back_limit).await {
            Ok(resolution) => {
                info!("reconnect resolved without exceeding look-back limit");
                let mut log = self.head_log.lock().await;
                log.append(&resolution.apply.iter().map(Tipset::key_height).collect::<Vec<_>>());
                log.persist()?;
                Ok(())
            }
            Err(_) => {
                warn!("reconnect gap exceeds look-back limit, requesting full resync");
                self.refresher_tx
                    .send(ResolvedHeadChange {
                        apply: Vec::new(),
                        revert_heights: Vec::new(),
                        reconnect: true,
                    })
                    .await
                    .ok();
                Ok(())
            }
        }
    }

    /// Schedules a debounced stable-head trigger; a new head arriving before
    /// the delay elapses cancels the prior schedule (§4.7 "Trigger
    /// debouncing").
    async fn schedule_trigger(&self, tip: Tipset) {
        let mut guard = self.debounce.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }
        let tx = self.selector_trigger_tx.clone();
        let delay = self.config.debounce_delay;
        *guard = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tx.send(tip).await.ok();
        }));
    }
}
