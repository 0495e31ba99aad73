// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;

use serde::{Deserialize, Serialize};

/// A content identifier for a message, in either unsigned or signed form.
///
/// We re-export the `cid` crate's type as the canonical hash but keep our own
/// newtype so the rest of the pipeline can implement `Serialize`/`Deserialize`
/// against a plain string column without dragging multicodec concerns into
/// every call site.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MsgCid(String);

impl MsgCid {
    pub fn new(s: impl Into<String>) -> Self {
        MsgCid(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MsgCid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<cid::Cid> for MsgCid {
    fn from(c: cid::Cid) -> Self {
        MsgCid(c.to_string())
    }
}

/// The sorted tuple of block CIDs identifying a tipset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TipsetKey(Vec<MsgCid>);

impl TipsetKey {
    pub fn new(mut cids: Vec<MsgCid>) -> Self {
        cids.sort();
        TipsetKey(cids)
    }

    pub fn cids(&self) -> &[MsgCid] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TipsetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.0.iter().map(MsgCid::as_str).collect();
        write!(f, "{{{}}}", parts.join(","))
    }
}
