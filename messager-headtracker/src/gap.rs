// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The ancestor-gap walk (§4.7): reconciles a newly-observed apply batch
//! against the persisted head log when the new head isn't a direct child of
//! what we last saw, bounded by `LookBackLimit`.

use std::sync::Arc;

use messager_core::rpc::ChainClient;
use messager_core::tipset::{ChainEpoch, Tipset, TipsetKeyHeight};

use crate::error::{HeadTrackerError, HeadTrackerResult};

#[derive(Debug)]
pub struct GapResolution {
    /// `apply ∪ gap`, newest first, in the order the chain should be
    /// replayed forward.
    pub apply: Vec<Tipset>,
    /// The persisted entries being dropped from the canonical chain.
    pub revert: Vec<TipsetKeyHeight>,
}

/// `local` must be sorted newest-first. `apply` is the incoming batch,
/// newest-first; its last element is the smallest (oldest) apply, `S`.
pub async fn resolve(
    chain: &Arc<dyn ChainClient>,
    local: &[TipsetKeyHeight],
    apply: Vec<Tipset>,
    look_back_limit: ChainEpoch,
) -> HeadTrackerResult<GapResolution> {
    let Some(smallest) = apply.last() else {
        return Ok(GapResolution {
            apply,
            revert: Vec::new(),
        });
    };

    if local.is_empty() || smallest.parents == local[0].key {
        return Ok(GapResolution {
            apply,
            revert: Vec::new(),
        });
    }

    let smallest_key = smallest.key.clone();
    let mut gap = Vec::new();
    let mut cur = smallest.clone();
    let mut i = 0usize;
    let mut walked = 0i64;

    loop {
        if walked > look_back_limit {
            return Err(HeadTrackerError::ReorgGapExceeded {
                found: walked,
                limit: look_back_limit,
            });
        }
        if i >= local.len() {
            break;
        }
        if local[i].height > cur.height {
            i += 1;
            continue;
        }
        if local[i].height == cur.height {
            if local[i].key == cur.key {
                break;
            }
            i += 1;
            continue;
        }
        // local[i].height < cur.height: step back one ancestor. `cur` is
        // only added to the gap once we've moved past the incoming apply
        // batch's own smallest tipset, which is already represented there.
        if cur.key != smallest_key {
            gap.push(cur.clone());
        }
        cur = chain.chain_get_tipset(&cur.parents).await?;
        walked += 1;
    }

    let mut combined = apply;
    combined.extend(gap);
    Ok(GapResolution {
        apply: combined,
        revert: local[..i].to_vec(),
    })
}
