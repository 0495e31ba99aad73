// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The Selector driver (§4.5): owns the per-address worker map, diffs it
//! against the active-address set on every trigger, and fans a selection
//! round out to every worker concurrently. Only this task mutates the
//! worker map (§5 shared-resource policy).

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use messager_address::AddressService;
use messager_core::address::Address;
use messager_core::rpc::{ChainClient, WalletClient};
use messager_core::tipset::Tipset;
use messager_store::{MessageCache, SharedParamsService, SqliteRepository};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, warn, Instrument};

use crate::config::SelectorConfig;
use crate::worker::Worker;

pub struct Selector {
    repo: Arc<SqliteRepository>,
    cache: Arc<MessageCache>,
    addresses: Arc<AddressService>,
    shared_params: Arc<SharedParamsService>,
    chain: Arc<dyn ChainClient>,
    wallet: Arc<dyn WalletClient>,
    config: Arc<SelectorConfig>,
    publish_tx: mpsc::Sender<Vec<messager_core::message::Message>>,
    workers: HashMap<Address, (Arc<Worker>, bool)>,
}

impl Selector {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Arc<SqliteRepository>,
        cache: Arc<MessageCache>,
        addresses: Arc<AddressService>,
        shared_params: Arc<SharedParamsService>,
        chain: Arc<dyn ChainClient>,
        wallet: Arc<dyn WalletClient>,
        config: Arc<SelectorConfig>,
        publish_tx: mpsc::Sender<Vec<messager_core::message::Message>>,
    ) -> Self {
        Selector {
            repo,
            cache,
            addresses,
            shared_params,
            chain,
            wallet,
            config,
            publish_tx,
            workers: HashMap::new(),
        }
    }

    /// Consumes debounced `stable head` triggers until `trigger_rx` closes or
    /// `cancel` fires.
    pub async fn run(
        mut self,
        mut trigger_rx: mpsc::Receiver<Tipset>,
        cancel: CancellationToken,
    ) {
        loop {
            let tip = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                tip = trigger_rx.recv() => tip,
            };
            let Some(tip) = tip else { break };
            self.run_round(&tip).await;
        }
    }

    async fn run_round(&mut self, tip: &Tipset) {
        if let Err(e) = self.sync_worker_set().await {
            warn!(error = %e, "failed to refresh active address set");
            return;
        }

        let mut rounds = FuturesUnordered::new();
        for (addr, (worker, busy)) in self.workers.iter_mut() {
            if *busy {
                continue;
            }
            *busy = true;
            let worker = worker.clone();
            let addr = addr.clone();
            let tip = tip.clone();
            rounds.push(async move {
                let span = info_span!("selector.round", addr = %addr, height = tip.height);
                let result = worker.run_round(&tip).instrument(span).await;
                (addr, result)
            });
        }

        while let Some((addr, result)) = rounds.next().await {
            if let Err(e) = result {
                warn!(addr = %addr, error = %e, "selection round failed");
            }
            if let Some((_, busy)) = self.workers.get_mut(&addr) {
                *busy = false;
            }
        }

        self.evict_idle_inactive(tip).await;
    }

    /// Adds a worker for every newly-active address. Eviction of stale,
    /// idle workers happens in [`Self::evict_idle_inactive`] after the round
    /// completes, so a busy worker always finishes its round first.
    async fn sync_worker_set(&mut self) -> anyhow::Result<()> {
        let active = self.addresses.active_addresses().await?;
        for addr in active {
            self.workers.entry(addr.clone()).or_insert_with(|| {
                let worker = Arc::new(Worker::new(
                    addr,
                    self.repo.clone(),
                    self.cache.clone(),
                    self.addresses.clone(),
                    self.shared_params.clone(),
                    self.chain.clone(),
                    self.wallet.clone(),
                    self.config.clone(),
                    self.publish_tx.clone(),
                ));
                (worker, false)
            });
        }
        Ok(())
    }

    async fn evict_idle_inactive(&mut self, _tip: &Tipset) {
        let active = match self.addresses.active_addresses().await {
            Ok(set) => set,
            Err(_) => return,
        };
        self.workers.retain(|addr, (_, busy)| *busy || active.contains(addr));
    }
}
