// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The administrative command dispatcher (§6, §9 "reflection-based
//! permission proxy"). `required_permission` is consulted once per call
//! before the matching arm of [`Command`] runs; there is no runtime method
//! synthesis, just a static table and a `match`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use messager_address::AddressService;
use messager_core::address::Address;
use messager_core::address_info::{AddressInfo, FeeParams, Node};
use messager_core::cid::MsgCid;
use messager_core::message::{Message, MessageState, MsgMeta, UnsignedMessage};
use messager_core::permission::{required_permission, satisfies, Permission};
use messager_core::rpc::{ChainClient, WalletClient};
use messager_core::shared_params::SharedParams;
use messager_headtracker::tracker::ResolvedHeadChange;
use messager_headtracker::StateRefresher;
use messager_selector::{replace as replace_message, ReplaceRequest};
use messager_store::repository::{message_repo, node_repo};
use messager_store::{MessageCache, SharedParamsService, SqliteRepository};
use uuid::Uuid;

use crate::error::{DispatchError, DispatchResult};
use crate::params::{self, ParamsCodec};

/// The `Send` typed-params convenience request (§9).
pub struct SendRequest {
    pub from: Address,
    pub to: Address,
    pub value: u128,
    pub actor_code: String,
    pub method_num: u64,
    pub codec: ParamsCodec,
    pub raw_params: Vec<u8>,
    pub gas_limit: i64,
    pub gas_fee_cap: u128,
    pub gas_premium: u128,
}

/// One admin-surface request. The variant name is also the permission-table
/// key (§6); see [`Command::method_name`].
pub enum Command {
    PushMessage(UnsignedMessage, Option<MsgMeta>, Option<String>),
    PushMessageWithId(Uuid, UnsignedMessage, Option<MsgMeta>),
    ForcePushMessageWithId(Uuid, UnsignedMessage, Option<MsgMeta>),
    GetMessageByUid(Uuid),
    HasMessageByUid(Uuid),
    GetMessageBySignedCid(MsgCid),
    GetMessageByUnsignedCid(MsgCid),
    GetMessageByFromAndNonce(Address, u64),
    WalletHas(String, Address),
    HasAddress(Address),
    Replace(ReplaceRequest),
    ListFailedMessage(Option<Address>),
    ListBlockedMessage(Option<Address>, Duration),
    SaveAddress(Address),
    UpdateNonce(Address, u64),
    Forbidden(Address),
    Activate(Address),
    SetSelectMsgNum(Address, u64),
    SetFeeParams(Address, FeeParams),
    ListActiveAddress,
    UpsertNode(Node),
    RemoveNode(String),
    ListNodes,
    GetSharedParams,
    SetSharedParams(SharedParams),
    RefreshSharedParams,
    MarkBadMessage(Uuid, String),
    ClearUnFillMessage(Address),
    RecoverFailedMsg(Uuid),
    UpdateAllFilledMessage,
    SetLogLevel(String),
    Send(SendRequest),
}

impl Command {
    fn method_name(&self) -> &'static str {
        match self {
            Command::PushMessage(..) => "PushMessage",
            Command::PushMessageWithId(..) => "PushMessageWithId",
            Command::ForcePushMessageWithId(..) => "ForcePushMessageWithId",
            Command::GetMessageByUid(_) => "GetMessageByUid",
            Command::HasMessageByUid(_) => "HasMessageByUid",
            Command::GetMessageBySignedCid(_) => "GetMessageBySignedCid",
            Command::GetMessageByUnsignedCid(_) => "GetMessageByUnsignedCid",
            Command::GetMessageByFromAndNonce(..) => "GetMessageByFromAndNonce",
            Command::WalletHas(..) => "WalletHas",
            Command::HasAddress(_) => "HasAddress",
            Command::Replace(_) => "Replace",
            Command::ListFailedMessage(_) => "ListFailedMessage",
            Command::ListBlockedMessage(..) => "ListBlockedMessage",
            Command::SaveAddress(_) => "SaveAddress",
            Command::UpdateNonce(..) => "UpdateNonce",
            Command::Forbidden(_) => "Forbidden",
            Command::Activate(_) => "Activate",
            Command::SetSelectMsgNum(..) => "SetSelectMsgNum",
            Command::SetFeeParams(..) => "SetFeeParams",
            Command::ListActiveAddress => "ListActiveAddress",
            Command::UpsertNode(_) => "UpsertNode",
            Command::RemoveNode(_) => "RemoveNode",
            Command::ListNodes => "ListNodes",
            Command::GetSharedParams => "GetSharedParams",
            Command::SetSharedParams(_) => "SetSharedParams",
            Command::RefreshSharedParams => "RefreshSharedParams",
            Command::MarkBadMessage(..) => "MarkBadMessage",
            Command::ClearUnFillMessage(_) => "ClearUnFillMessage",
            Command::RecoverFailedMsg(_) => "RecoverFailedMsg",
            Command::UpdateAllFilledMessage => "UpdateAllFilledMessage",
            Command::SetLogLevel(_) => "SetLogLevel",
            Command::Send(_) => "Send",
        }
    }
}

/// What a dispatched command hands back to its caller. Kept deliberately
/// loose (no shared response enum per method) since the transport carrying
/// these across a process boundary is out of this system's scope (§6).
#[derive(Debug)]
pub enum Response {
    Unit,
    Bool(bool),
    Message(Option<Message>),
    Messages(Vec<Message>),
    Addresses(Vec<AddressInfo>),
    SharedParams(SharedParams),
    Nodes(Vec<Node>),
}

pub struct Dispatcher {
    repo: Arc<SqliteRepository>,
    cache: Arc<MessageCache>,
    addresses: Arc<AddressService>,
    shared_params: Arc<SharedParamsService>,
    chain: Arc<dyn ChainClient>,
    wallet: Arc<dyn WalletClient>,
    refresher: Arc<StateRefresher>,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Arc<SqliteRepository>,
        cache: Arc<MessageCache>,
        addresses: Arc<AddressService>,
        shared_params: Arc<SharedParamsService>,
        chain: Arc<dyn ChainClient>,
        wallet: Arc<dyn WalletClient>,
        refresher: Arc<StateRefresher>,
    ) -> Self {
        Dispatcher {
            repo,
            cache,
            addresses,
            shared_params,
            chain,
            wallet,
            refresher,
        }
    }

    /// Checks `granted` against the static permission table, then runs the
    /// command. A denial never touches state.
    pub async fn dispatch(&self, granted: Permission, command: Command) -> DispatchResult<Response> {
        let method = command.method_name();
        let required = required_permission(method);
        if !satisfies(granted, required) {
            return Err(DispatchError::PermissionDenied { method, required });
        }
        self.run(command).await
    }

    async fn run(&self, command: Command) -> DispatchResult<Response> {
        match command {
            Command::PushMessage(unsigned, meta, from_user) => {
                let mut msg = Message::new_unfilled(Uuid::new_v4(), unsigned, meta);
                msg.from_user = from_user;
                message_repo::create_message(self.repo.pool(), &msg).await?;
                self.cache.set(msg.clone());
                Ok(Response::Message(Some(msg)))
            }
            Command::PushMessageWithId(id, unsigned, meta) => {
                if message_repo::get_by_id(self.repo.pool(), id).await?.is_some() {
                    return Err(DispatchError::Other(anyhow::anyhow!(
                        "message id {id} already exists"
                    )));
                }
                let msg = Message::new_unfilled(id, unsigned, meta);
                message_repo::create_message(self.repo.pool(), &msg).await?;
                self.cache.set(msg.clone());
                Ok(Response::Message(Some(msg)))
            }
            Command::ForcePushMessageWithId(id, unsigned, meta) => {
                let msg = Message::new_unfilled(id, unsigned, meta);
                message_repo::save_message(self.repo.pool(), &msg).await?;
                self.cache.set(msg.clone());
                Ok(Response::Message(Some(msg)))
            }
            Command::GetMessageByUid(id) => {
                Ok(Response::Message(self.cache.get(id).await?))
            }
            Command::HasMessageByUid(id) => {
                Ok(Response::Bool(self.cache.get(id).await?.is_some()))
            }
            Command::GetMessageBySignedCid(cid) => Ok(Response::Message(
                message_repo::get_by_signed_cid(self.repo.pool(), &cid).await?,
            )),
            Command::GetMessageByUnsignedCid(cid) => Ok(Response::Message(
                message_repo::get_by_unsigned_cid(self.repo.pool(), &cid).await?,
            )),
            Command::GetMessageByFromAndNonce(from, nonce) => Ok(Response::Message(
                message_repo::get_by_from_nonce(self.repo.pool(), &from, nonce).await?,
            )),
            Command::WalletHas(account, addr) => {
                let has = self.wallet.wallet_has(&account, &addr).await?;
                Ok(Response::Bool(has))
            }
            Command::HasAddress(addr) => match self.addresses.get(&addr).await {
                Ok(_) => Ok(Response::Bool(true)),
                Err(messager_address::AddressServiceError::NotFound(_)) => Ok(Response::Bool(false)),
                Err(e) => Err(e.into()),
            },
            Command::Replace(req) => {
                let msg = message_repo::get_by_id(self.repo.pool(), req.id)
                    .await?
                    .ok_or(DispatchError::MessageNotFound(req.id))?;
                let signers = self.addresses.get_accounts_of_signer(msg.from()).await?;
                let tip = self.chain.chain_head().await?;
                let replaced =
                    replace_message(&self.repo, &self.chain, &self.wallet, &signers, &tip.key, req).await?;
                self.cache.set(replaced.clone());
                Ok(Response::Message(Some(replaced)))
            }
            Command::ListFailedMessage(from) => Ok(Response::Messages(
                message_repo::list_failed(self.repo.pool(), from.as_ref()).await?,
            )),
            Command::ListBlockedMessage(from, min_age) => {
                let min_age = ChronoDuration::from_std(min_age).unwrap_or(ChronoDuration::zero());
                Ok(Response::Messages(
                    message_repo::list_blocked(self.repo.pool(), from.as_ref(), min_age).await?,
                ))
            }
            Command::SaveAddress(addr) => {
                self.addresses.save_address(addr).await?;
                Ok(Response::Unit)
            }
            Command::UpdateNonce(addr, nonce) => {
                self.addresses.update_nonce(&addr, nonce).await?;
                Ok(Response::Unit)
            }
            Command::Forbidden(addr) => {
                self.addresses.forbidden(&addr).await?;
                Ok(Response::Unit)
            }
            Command::Activate(addr) => {
                self.addresses.activate(&addr).await?;
                Ok(Response::Unit)
            }
            Command::SetSelectMsgNum(addr, n) => {
                self.addresses.set_select_msg_num(&addr, n).await?;
                Ok(Response::Unit)
            }
            Command::SetFeeParams(addr, fee) => {
                self.addresses.set_fee_params(&addr, &fee).await?;
                Ok(Response::Unit)
            }
            Command::ListActiveAddress => {
                Ok(Response::Addresses(self.addresses.list_active_address().await?))
            }
            Command::UpsertNode(node) => {
                node_repo::upsert_node(self.repo.pool(), &node).await?;
                Ok(Response::Unit)
            }
            Command::RemoveNode(name) => {
                node_repo::remove_node(self.repo.pool(), &name).await?;
                Ok(Response::Unit)
            }
            Command::ListNodes => Ok(Response::Nodes(node_repo::list_nodes(self.repo.pool()).await?)),
            Command::GetSharedParams => Ok(Response::SharedParams((*self.shared_params.get()).clone())),
            Command::SetSharedParams(params) => {
                self.shared_params.set(params).await?;
                Ok(Response::Unit)
            }
            Command::RefreshSharedParams => {
                self.shared_params.refresh().await?;
                Ok(Response::Unit)
            }
            Command::MarkBadMessage(id, reason) => {
                message_repo::mark_bad_message(self.repo.pool(), id, &reason).await?;
                self.cache.delete(id);
                Ok(Response::Unit)
            }
            Command::ClearUnFillMessage(from) => {
                let pending =
                    message_repo::list_unfilled_oldest_first(self.repo.pool(), &from, i64::MAX).await?;
                let ids: Vec<Uuid> = pending.iter().map(|m| m.id).collect();
                message_repo::expire_messages(self.repo.pool(), &ids).await?;
                for id in ids {
                    self.cache.delete(id);
                }
                Ok(Response::Unit)
            }
            Command::RecoverFailedMsg(id) => {
                let mut msg = message_repo::get_by_id(self.repo.pool(), id)
                    .await?
                    .ok_or(DispatchError::MessageNotFound(id))?;
                if msg.state != MessageState::FailedMsg {
                    return Err(DispatchError::Other(anyhow::anyhow!(
                        "message {id} is not FailedMsg, cannot recover"
                    )));
                }
                msg.state = MessageState::UnFillMsg;
                msg.signature = None;
                msg.unsigned_cid = None;
                msg.signed_cid = None;
                msg.error_msg = None;
                message_repo::save_message(self.repo.pool(), &msg).await?;
                self.cache.set(msg.clone());
                Ok(Response::Message(Some(msg)))
            }
            Command::UpdateAllFilledMessage => {
                self.refresher
                    .process(ResolvedHeadChange {
                        apply: Vec::new(),
                        revert_heights: Vec::new(),
                        reconnect: true,
                    })
                    .await?;
                Ok(Response::Unit)
            }
            Command::SetLogLevel(_filter) => {
                // `tracing_subscriber`'s global filter is fixed at process
                // start (§4.11); runtime adjustment would need a
                // `reload::Handle` wired in at `init`, which the current
                // binary does not install.
                Err(DispatchError::Other(anyhow::anyhow!(
                    "SetLogLevel requires a reloadable tracing filter, not configured for this process"
                )))
            }
            Command::Send(req) => {
                let encoded = params::encode(&req.actor_code, req.method_num, req.codec, &req.raw_params)?;
                let unsigned = UnsignedMessage {
                    from: req.from,
                    to: req.to,
                    nonce: 0,
                    value: req.value,
                    gas_limit: req.gas_limit,
                    gas_fee_cap: req.gas_fee_cap,
                    gas_premium: req.gas_premium,
                    method: req.method_num,
                    params: encoded,
                };
                let msg = Message::new_unfilled(Uuid::new_v4(), unsigned, None);
                message_repo::create_message(self.repo.pool(), &msg).await?;
                self.cache.set(msg.clone());
                Ok(Response::Message(Some(msg)))
            }
        }
    }
}
