// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Serialize};

use crate::cid::TipsetKey;

pub type ChainEpoch = i64;

/// A minimal view of a tipset: enough for the reorg gap algorithm and for
/// persisting the head log. The actual block contents live with the chain
/// node; this crate never needs more than key/height/parents/base fee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipsetKeyHeight {
    pub key: TipsetKey,
    pub height: ChainEpoch,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tipset {
    pub key: TipsetKey,
    pub height: ChainEpoch,
    pub parents: TipsetKey,
    /// Parent base fee, in atto-FIL, used to decide whether a candidate's
    /// `meta.base_fee` floor has been met.
    pub parent_base_fee: u128,
}

impl Tipset {
    pub fn key_height(&self) -> TipsetKeyHeight {
        TipsetKeyHeight {
            key: self.key.clone(),
            height: self.height,
        }
    }
}

/// A notification batch from the chain node's head-change stream.
#[derive(Clone, Debug, Default)]
pub struct HeadChange {
    /// Newest first.
    pub apply: Vec<Tipset>,
    /// Newest first.
    pub revert: Vec<Tipset>,
}
