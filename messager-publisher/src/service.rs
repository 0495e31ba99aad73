// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Consumes batches of freshly-signed messages and pushes them to the chain
//! (§4.6). Never retries internally: a push that fails stays `FillMsg` and
//! is picked up again by the Selector's rebroadcast set on the next round.

use std::sync::Arc;

use messager_core::message::Message;
use messager_core::rpc::{ChainClient, SignedMessageWire};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, warn, Instrument};

use crate::error::PublisherError;

pub struct Publisher {
    primary: Arc<dyn ChainClient>,
    secondary: Vec<Arc<dyn ChainClient>>,
    rx: mpsc::Receiver<Vec<Message>>,
}

impl Publisher {
    pub fn new(
        primary: Arc<dyn ChainClient>,
        secondary: Vec<Arc<dyn ChainClient>>,
        rx: mpsc::Receiver<Vec<Message>>,
    ) -> Self {
        Publisher { primary, secondary, rx }
    }

    /// Runs until the sender side of the channel is dropped or `cancel` is
    /// triggered, draining whatever batch is already in flight first.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let batch = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                batch = self.rx.recv() => batch,
            };
            let Some(batch) = batch else { break };
            self.push_batch(batch).await;
        }
    }

    async fn push_batch(&self, batch: Vec<Message>) {
        for msg in &batch {
            let span = info_span!("publisher.push", id = %msg.id, nonce = msg.nonce());
            self.push_one(msg).instrument(span).await;
        }
    }

    async fn push_one(&self, msg: &Message) {
        let wire = match SignedMessageWire::try_from(msg) {
            Ok(wire) => wire,
            Err(e) => {
                warn!(error = %PublisherError::Unsigned(e.to_string()), "skipping unsigned message");
                return;
            }
        };

        if let Err(e) = self.primary.mpool_push(&wire).await {
            warn!(error = %e, "primary mpool_push failed");
        }

        for node in &self.secondary {
            if let Err(e) = node.mpool_push(&wire).await {
                warn!(error = %e, "secondary mpool_push failed");
            }
        }
    }
}
