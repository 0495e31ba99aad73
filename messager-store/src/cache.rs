// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Bounded, advisory mirror of recently-touched messages (§4.2). A miss
//! always forces a repository read; a hit may be stale. Correctness of the
//! pipeline never depends on this cache being coherent — it exists purely
//! to save repository round-trips on the hot selector/state-refresher path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use messager_core::cid::MsgCid;
use messager_core::message::Message;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::repository::{message_repo, SqliteRepository};

struct Entry {
    msg: Message,
    inserted_at: Instant,
}

struct Inner {
    by_id: HashMap<Uuid, Entry>,
    by_unsigned_cid: HashMap<MsgCid, Uuid>,
    ttl: Duration,
    capacity: usize,
}

impl Inner {
    fn evict_expired(&mut self) {
        let ttl = self.ttl;
        let now = Instant::now();
        self.by_id.retain(|_, e| now.duration_since(e.inserted_at) < ttl);
        self.by_unsigned_cid.retain(|_, id| self.by_id.contains_key(id));
    }

    fn insert(&mut self, msg: Message) {
        if self.by_id.len() >= self.capacity && !self.by_id.contains_key(&msg.id) {
            // Bounded: drop the oldest entry to make room. A linear scan is
            // fine at the scale this cache runs at (thousands, not millions).
            if let Some(oldest) = self
                .by_id
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(id, _)| *id)
            {
                self.by_id.remove(&oldest);
            }
        }
        if let Some(cid) = &msg.unsigned_cid {
            self.by_unsigned_cid.insert(cid.clone(), msg.id);
        }
        self.by_id.insert(
            msg.id,
            Entry {
                msg,
                inserted_at: Instant::now(),
            },
        );
    }
}

pub struct MessageCache {
    inner: Mutex<Inner>,
    repo: Arc<SqliteRepository>,
}

impl MessageCache {
    pub fn new(repo: Arc<SqliteRepository>, capacity: usize, ttl: Duration) -> Self {
        MessageCache {
            inner: Mutex::new(Inner {
                by_id: HashMap::new(),
                by_unsigned_cid: HashMap::new(),
                ttl,
                capacity,
            }),
            repo,
        }
    }

    /// Warms the cache from every signed message created within
    /// `lookback` of now, as required at startup (§4.2).
    pub async fn warm(&self, lookback: Duration) -> anyhow::Result<()> {
        let cutoff = chrono::Utc::now() - chrono::Duration::from_std(lookback)?;
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT id FROM messages WHERE signed_cid IS NOT NULL AND created_at >= ?",
        )
        .bind(cutoff)
        .fetch_all(self.repo.pool())
        .await?;
        for (id,) in rows {
            if let Ok(id) = Uuid::parse_str(&id) {
                if let Ok(Some(msg)) = message_repo::get_by_id(self.repo.pool(), id).await {
                    self.inner.lock().insert(msg);
                }
            }
        }
        Ok(())
    }

    pub fn get_cached(&self, id: Uuid) -> Option<Message> {
        let mut inner = self.inner.lock();
        inner.evict_expired();
        inner.by_id.get(&id).map(|e| e.msg.clone())
    }

    /// `Get(id)`: a cache miss falls through to the repository.
    pub async fn get(&self, id: Uuid) -> anyhow::Result<Option<Message>> {
        if let Some(msg) = self.get_cached(id) {
            return Ok(Some(msg));
        }
        let msg = message_repo::get_by_id(self.repo.pool(), id).await?;
        if let Some(msg) = &msg {
            self.inner.lock().insert(msg.clone());
        }
        Ok(msg)
    }

    pub fn set(&self, msg: Message) {
        self.inner.lock().insert(msg);
    }

    pub fn delete(&self, id: Uuid) {
        let mut inner = self.inner.lock();
        inner.by_id.remove(&id);
        inner.by_unsigned_cid.retain(|_, v| *v != id);
    }

    /// `Mutate(id, fn)`: read-modify-write against the cache only. The
    /// caller is responsible for persisting through its own transaction;
    /// this never writes to the repository.
    pub async fn mutate<F>(&self, id: Uuid, f: F) -> anyhow::Result<Option<Message>>
    where
        F: FnOnce(&mut Message),
    {
        let mut msg = match self.get(id).await? {
            Some(m) => m,
            None => return Ok(None),
        };
        f(&mut msg);
        self.inner.lock().insert(msg.clone());
        Ok(Some(msg))
    }

    /// `UpdateByCid(cid, fn)`: resolves through the secondary index, falling
    /// back to a repository lookup on miss.
    pub async fn update_by_cid<F>(&self, cid: &MsgCid, f: F) -> anyhow::Result<Option<Message>>
    where
        F: FnOnce(&mut Message),
    {
        let id = {
            let inner = self.inner.lock();
            inner.by_unsigned_cid.get(cid).copied()
        };
        let id = match id {
            Some(id) => id,
            None => match message_repo::get_by_unsigned_cid(self.repo.pool(), cid).await? {
                Some(msg) => msg.id,
                None => return Ok(None),
            },
        };
        self.mutate(id, f).await
    }
}
