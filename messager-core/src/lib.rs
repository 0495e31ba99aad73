// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Domain types, error kinds and RPC client traits shared by every crate in
//! the signing and submission pipeline. Nothing in here talks to a
//! database, a socket or a clock directly — those concerns live in
//! `messager-store`, the RPC client implementations, and the `messager`
//! binary respectively.

pub mod address;
pub mod address_info;
pub mod cid;
pub mod error;
pub mod message;
pub mod permission;
pub mod rpc;
pub mod shared_params;
pub mod tipset;

pub use address::Address;
pub use address_info::{AddressInfo, AddressState, FeeParams, Node};
pub use cid::{MsgCid, TipsetKey};
pub use error::{CoreError, CoreResult};
pub use message::{Message, MessageState, MsgMeta, Receipt, Signature, SignatureType, UnsignedMessage};
pub use permission::Permission;
pub use shared_params::SharedParams;
pub use tipset::{ChainEpoch, HeadChange, Tipset, TipsetKeyHeight};
