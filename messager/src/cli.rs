// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! `clap`-derive CLI: `messager run` starts the daemon, `messager admin ...`
//! issues a single admin-surface command against the same database (§6).
//! The transport carrying admin commands between a separate client and a
//! running daemon is out of scope (§1); this binary dispatches locally.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use messager_core::address::Address;
use messager_core::message::UnsignedMessage;
use uuid::Uuid;

use crate::dispatcher::{Command, SendRequest};
use crate::params::ParamsCodec;

#[derive(Parser)]
#[command(name = "messager", about = "Message signing and submission pipeline")]
pub struct Cli {
    #[arg(long, default_value = "messager.toml")]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: TopCommand,
}

#[derive(Subcommand)]
pub enum TopCommand {
    /// Runs the daemon: HeadTracker, StateRefresher, Selector and Publisher.
    Run,
    /// Issues one admin-surface command against the configured database.
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Subcommand)]
pub enum AdminCommand {
    Push {
        from: String,
        to: String,
        value: u128,
        #[arg(long, default_value_t = 0)]
        method: u64,
        #[arg(long)]
        hex_params: Option<String>,
    },
    Get {
        id: Uuid,
    },
    ListFailed {
        from: Option<String>,
    },
    Replace {
        id: Uuid,
        #[arg(long)]
        auto: bool,
        #[arg(long)]
        max_fee: Option<u128>,
        #[arg(long)]
        gas_limit: Option<i64>,
        #[arg(long)]
        gas_premium: Option<u128>,
        #[arg(long)]
        gas_fee_cap: Option<u128>,
    },
    RecoverFailed {
        id: Uuid,
    },
    MarkBad {
        id: Uuid,
        reason: String,
    },
    ClearUnfilled {
        from: String,
    },
    UpdateAllFilled,
    AddressSave {
        addr: String,
    },
    AddressForbid {
        addr: String,
    },
    AddressActivate {
        addr: String,
    },
    AddressList,
    AddressSetCap {
        addr: String,
        n: u64,
    },
    SharedParamsGet,
    SharedParamsRefresh,
    NodeUpsert {
        name: String,
        url: String,
        #[arg(long)]
        token: Option<String>,
    },
    NodeRemove {
        name: String,
    },
    NodeList,
    Send {
        from: String,
        to: String,
        value: u128,
        #[arg(long, default_value = "fil/10/account")]
        actor_code: String,
        #[arg(long, default_value_t = 0)]
        method: u64,
        #[arg(long, default_value_t = 0)]
        gas_limit: i64,
        #[arg(long, default_value_t = 0)]
        gas_fee_cap: u128,
        #[arg(long, default_value_t = 0)]
        gas_premium: u128,
        #[arg(long)]
        hex_params: Option<String>,
    },
}

impl AdminCommand {
    pub fn into_command(self) -> anyhow::Result<Command> {
        Ok(match self {
            AdminCommand::Push { from, to, value, method, hex_params } => {
                Command::PushMessage(
                    UnsignedMessage {
                        from: Address::new(from),
                        to: Address::new(to),
                        nonce: 0,
                        value,
                        gas_limit: 0,
                        gas_fee_cap: 0,
                        gas_premium: 0,
                        method,
                        params: hex_params.map(|s| s.into_bytes()).unwrap_or_default(),
                    },
                    None,
                    None,
                )
            }
            AdminCommand::Get { id } => Command::GetMessageByUid(id),
            AdminCommand::ListFailed { from } => Command::ListFailedMessage(from.map(Address::new)),
            AdminCommand::Replace { id, auto, max_fee, gas_limit, gas_premium, gas_fee_cap } => {
                Command::Replace(messager_selector::ReplaceRequest {
                    id,
                    auto,
                    max_fee,
                    gas_limit,
                    gas_premium,
                    gas_fee_cap,
                })
            }
            AdminCommand::RecoverFailed { id } => Command::RecoverFailedMsg(id),
            AdminCommand::MarkBad { id, reason } => Command::MarkBadMessage(id, reason),
            AdminCommand::ClearUnfilled { from } => Command::ClearUnFillMessage(Address::new(from)),
            AdminCommand::UpdateAllFilled => Command::UpdateAllFilledMessage,
            AdminCommand::AddressSave { addr } => Command::SaveAddress(Address::new(addr)),
            AdminCommand::AddressForbid { addr } => Command::Forbidden(Address::new(addr)),
            AdminCommand::AddressActivate { addr } => Command::Activate(Address::new(addr)),
            AdminCommand::AddressList => Command::ListActiveAddress,
            AdminCommand::AddressSetCap { addr, n } => Command::SetSelectMsgNum(Address::new(addr), n),
            AdminCommand::SharedParamsGet => Command::GetSharedParams,
            AdminCommand::SharedParamsRefresh => Command::RefreshSharedParams,
            AdminCommand::NodeUpsert { name, url, token } => {
                Command::UpsertNode(messager_core::address_info::Node { name, url, token })
            }
            AdminCommand::NodeRemove { name } => Command::RemoveNode(name),
            AdminCommand::NodeList => Command::ListNodes,
            AdminCommand::Send {
                from,
                to,
                value,
                actor_code,
                method,
                gas_limit,
                gas_fee_cap,
                gas_premium,
                hex_params,
            } => Command::Send(SendRequest {
                from: Address::new(from),
                to: Address::new(to),
                value,
                actor_code,
                method_num: method,
                codec: ParamsCodec::Hex,
                raw_params: hex_params.map(|s| s.into_bytes()).unwrap_or_default(),
                gas_limit,
                gas_fee_cap,
                gas_premium,
            }),
        })
    }
}
