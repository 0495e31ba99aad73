// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Process entry point: loads configuration, wires the pipeline's tasks
//! together, and exposes the admin surface as a one-shot CLI subcommand
//! (§4.11, §6).

use std::sync::Arc;

use clap::Parser;
use messager_address::AddressService;
use messager_core::message::Message;
use messager_core::permission::Permission;
use messager_core::rpc::{AuthClient, ChainClient, WalletClient};
use messager_core::tipset::Tipset;
use messager_headtracker::{HeadTracker, ResolvedHeadChange, StateRefresher};
use messager_publisher::Publisher;
use messager_selector::Selector;
use messager_store::{MessageCache, SharedParamsService, SqliteRepository};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use messager::cli::{Cli, TopCommand};
use messager::config::MessagerConfig;
use messager::dispatcher::{Dispatcher, Response};
use messager::{logging, rpc_stub};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = MessagerConfig::load(&cli.config)?;
    logging::init(&settings.log_filter);

    let repo = Arc::new(SqliteRepository::connect(&settings.database_url).await?);
    repo.migrate().await?;

    let cache = Arc::new(MessageCache::new(
        repo.clone(),
        settings.cache_capacity,
        settings.cache_ttl,
    ));
    cache.warm(settings.cache_warmup_lookback).await?;

    // The chain node / wallet / auth service implementations are a
    // deliberately out-of-scope external collaborator (§1): a real
    // deployment swaps these for an actual transport without touching
    // anything downstream.
    let chain: Arc<dyn ChainClient> = Arc::new(rpc_stub::UnconfiguredChainClient);
    let wallet: Arc<dyn WalletClient> = Arc::new(rpc_stub::UnconfiguredWalletClient);
    let auth: Arc<dyn AuthClient> = Arc::new(rpc_stub::UnconfiguredAuthClient);

    let addresses = Arc::new(AddressService::new(repo.clone(), auth));
    let shared_params = Arc::new(SharedParamsService::load(repo.clone()).await?);
    let refresher = Arc::new(StateRefresher::new(
        repo.clone(),
        cache.clone(),
        addresses.clone(),
        chain.clone(),
    ));

    match cli.command {
        TopCommand::Run => {
            run_daemon(
                repo,
                cache,
                addresses,
                shared_params,
                chain,
                wallet,
                refresher,
                settings,
            )
            .await
        }
        TopCommand::Admin { command } => {
            let dispatcher = Dispatcher::new(
                repo,
                cache,
                addresses,
                shared_params,
                chain,
                wallet,
                refresher,
            );
            let command = command.into_command()?;
            let response = dispatcher.dispatch(Permission::Admin, command).await?;
            print_response(response);
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_daemon(
    repo: Arc<SqliteRepository>,
    cache: Arc<MessageCache>,
    addresses: Arc<AddressService>,
    shared_params: Arc<SharedParamsService>,
    chain: Arc<dyn ChainClient>,
    wallet: Arc<dyn WalletClient>,
    refresher: Arc<StateRefresher>,
    settings: MessagerConfig,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let (refresher_tx, refresher_rx) = mpsc::channel::<ResolvedHeadChange>(64);
    let (trigger_tx, trigger_rx) = mpsc::channel::<Tipset>(16);
    let (publish_tx, publish_rx) = mpsc::channel::<Vec<Message>>(64);

    let head_tracker = Arc::new(HeadTracker::new(
        chain.clone(),
        Arc::new(settings.head_tracker.clone()),
        refresher_tx,
        trigger_tx,
    )?);

    let selector = Selector::new(
        repo.clone(),
        cache.clone(),
        addresses.clone(),
        shared_params.clone(),
        chain.clone(),
        wallet.clone(),
        Arc::new(settings.selector.clone()),
        publish_tx,
    );

    let publisher = Publisher::new(chain.clone(), Vec::new(), publish_rx);

    let mut tasks = Vec::new();

    {
        let head_tracker = head_tracker.clone();
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = head_tracker.run(cancel).await {
                error!(error = %e, "head tracker task exited");
            }
        }));
    }

    {
        let refresher = (*refresher).clone();
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(async move {
            refresher.run(refresher_rx, cancel).await;
        }));
    }

    {
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(async move {
            selector.run(trigger_rx, cancel).await;
        }));
    }

    {
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(async move {
            publisher.run(cancel).await;
        }));
    }

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, draining tasks");
    cancel.cancel();

    for task in tasks {
        let _ = task.await;
    }

    Ok(())
}

fn print_response(response: Response) {
    let json = match response {
        Response::Unit => serde_json::json!({ "ok": true }),
        Response::Bool(b) => serde_json::json!(b),
        Response::Message(m) => serde_json::json!(m),
        Response::Messages(m) => serde_json::json!(m),
        Response::Addresses(a) => serde_json::json!(a),
        Response::SharedParams(p) => serde_json::json!(p),
        Response::Nodes(n) => serde_json::json!(n),
    };
    match serde_json::to_string_pretty(&json) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{json}"),
    }
}
