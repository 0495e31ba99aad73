// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Deterministic content addressing for unsigned/signed messages. The real
//! chain node is the source of truth for a message's on-chain cid; these
//! helpers only need to produce a stable local identifier so the selector
//! can populate `unsignedCid`/`signedCid` before the node has seen the
//! message.

use std::hash::{Hash, Hasher};

use messager_core::cid::MsgCid;
use messager_core::message::{Signature, UnsignedMessage};

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

pub fn unsigned_cid(msg: &UnsignedMessage) -> MsgCid {
    let encoded = serde_json::to_vec(msg).expect("UnsignedMessage serializes");
    MsgCid::new(format!("bafy2unsg{:016x}", fnv1a(&encoded)))
}

pub fn signed_cid(msg: &UnsignedMessage, sig: &Signature) -> MsgCid {
    let mut encoded = serde_json::to_vec(msg).expect("UnsignedMessage serializes");
    encoded.extend_from_slice(&sig.bytes);
    MsgCid::new(format!("bafy2sig{:016x}", fnv1a(&encoded)))
}
