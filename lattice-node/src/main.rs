//! Lattice Node
//!
//! A worker node of a pull-based compute grid.
//!
//! Architecture:
//! - Configuration: command-line flags with environment fallbacks
//! - Repositories: HTTP communication with the job server (seeds, jobs, results)
//! - Services: randomness initialization, model dispatch, retry policies
//! - Scheduler: node state and the tick-driven polling loop
//! - Logging: structured log records on a shared bus, rendered to the console
//!
//! The node fetches its randomness seeds once, then polls the server for jobs
//! on a fixed clock, runs each job with the matching model and reports the
//! result back.

mod config;
mod identity;
mod logging;
mod models;
mod random;
mod repository;
mod scheduler;
mod service;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::NodeArgs;
use crate::identity::NodeIdentity;
use crate::logging::{ConsoleRenderer, LogBus, spawn_console};
use crate::models::SamplingModel;
use crate::repository::{HttpJobRepository, HttpResultRepository, HttpSeedRepository};
use crate::scheduler::Orchestrator;
use crate::service::Model;
use lattice_client::GridClient;

const CONSOLE_DRAIN: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    // Process diagnostics; job logs go through the log bus
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lattice_node=info,lattice_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = NodeArgs::parse().into_config();
    config.validate()?;

    let bus = LogBus::new(config.log_capacity);
    let console = spawn_console(
        &bus,
        ConsoleRenderer::new(config.verbose, config.progress_every),
    );

    let identity = NodeIdentity::generate(config.id.as_deref());
    let server_url = config.server_url();
    info!(
        "Starting Lattice Node: machine_id={}, instance_id={}, server_url={}",
        identity.machine_id(),
        identity.instance_id(),
        server_url
    );

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let client = Arc::new(GridClient::with_client(server_url, http));

    let models: Vec<Arc<dyn Model>> = vec![Arc::new(SamplingModel)];

    let orchestrator = Arc::new(Orchestrator::new(
        &config,
        identity,
        bus.logger("node"),
        Arc::new(HttpSeedRepository::new(client.clone())),
        Arc::new(HttpJobRepository::new(client.clone())),
        Arc::new(HttpResultRepository::new(client)),
        models,
    ));
    orchestrator
        .logger()
        .info(format!("Models: {}", orchestrator.models().join(", ")));

    let mut states = orchestrator.subscribe_state();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            debug!("Node state: {} (busy: {})", state, state.is_busy());
        }
    });

    let mut outcomes = orchestrator.subscribe_outcomes();
    tokio::spawn(async move {
        let (mut reported, mut empty) = (0u64, 0u64);
        loop {
            match outcomes.recv().await {
                Ok(true) => reported += 1,
                Ok(false) => empty += 1,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
            debug!("Ticks: {} job(s) reported, {} without a result", reported, empty);
        }
    });

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
            shutdown.cancel();
        }
    });

    let node = Arc::clone(&orchestrator);
    let outcome = orchestrator.run(cancel).await;

    let result = match outcome {
        Ok(()) => {
            info!("Node {} stopped ({})", node.identity(), node.state());
            Ok(())
        }
        Err(e) => {
            error!("Node {} could not start: {}", node.identity(), e);
            Err(e.into())
        }
    };

    // Let the console drain what the loop emitted before it goes away
    drop(node);
    drop(bus);
    let _ = tokio::time::timeout(CONSOLE_DRAIN, console).await;

    result
}
