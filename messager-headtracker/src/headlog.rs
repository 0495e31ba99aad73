// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The on-disk head log: a height-sorted, bounded record of recently-seen
//! tipsets, persisted as JSON with atomic rename-on-write (§6 persisted
//! state layout).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use messager_core::cid::TipsetKey;
use messager_core::tipset::{ChainEpoch, TipsetKeyHeight};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct HeadLogEntry {
    key: TipsetKey,
    height: ChainEpoch,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct HeadLogFile {
    cache: BTreeMap<ChainEpoch, HeadLogEntry>,
    curr_height: ChainEpoch,
}

pub struct HeadLog {
    path: PathBuf,
    capacity: usize,
    file: HeadLogFile,
}

impl HeadLog {
    /// Loads the persisted log at `path`, or starts empty if it doesn't
    /// exist yet (first run).
    pub fn load(path: impl AsRef<Path>, capacity: usize) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            HeadLogFile::default()
        };
        Ok(HeadLog { path, capacity, file })
    }

    pub fn curr_height(&self) -> ChainEpoch {
        self.file.curr_height
    }

    /// Newest-first view of persisted tipsets.
    pub fn entries(&self) -> Vec<TipsetKeyHeight> {
        self.file
            .cache
            .values()
            .rev()
            .map(|e| TipsetKeyHeight {
                key: e.key.clone(),
                height: e.height,
            })
            .collect()
    }

    /// Appends `applied` (newest first) and truncates to `capacity`,
    /// dropping the lowest heights first.
    pub fn append(&mut self, applied: &[TipsetKeyHeight]) {
        for tsk in applied {
            self.file.cache.insert(
                tsk.height,
                HeadLogEntry {
                    key: tsk.key.clone(),
                    height: tsk.height,
                },
            );
            if tsk.height > self.file.curr_height {
                self.file.curr_height = tsk.height;
            }
        }
        while self.file.cache.len() > self.capacity {
            if let Some((&lowest, _)) = self.file.cache.iter().next() {
                self.file.cache.remove(&lowest);
            }
        }
    }

    /// Drops the given heights, used when a revert removes tipsets from the
    /// canonical chain.
    pub fn remove(&mut self, heights: &[ChainEpoch]) {
        for h in heights {
            self.file.cache.remove(h);
        }
    }

    /// Writes the log via a temp file + rename so a crash mid-write never
    /// leaves a truncated log behind.
    pub fn persist(&self) -> anyhow::Result<()> {
        let tmp_path = self.path.with_extension("tmp");
        let serialized = serde_json::to_vec_pretty(&self.file)?;
        std::fs::write(&tmp_path, serialized)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
