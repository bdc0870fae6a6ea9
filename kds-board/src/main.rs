//! KDS Board - Main entry point
//!
//! Counter-side order dashboard service: polls the remote order source,
//! tracks newly-arrived orders, drives the audible alert loop, and serves
//! the dashboard API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kds_board::api::{self, session::SessionStore, AppState};
use kds_board::checklist::ChecklistStore;
use kds_board::notifier::{EventAlertSink, NotificationController};
use kds_board::poller::OrderPoller;
use kds_board::remote::HttpOrderSource;
use kds_board::snapshot::SnapshotStore;
use kds_board::state::BoardState;
use kds_board::transition::TransitionService;
use kds_common::config::BoardConfig;
use kds_common::db::init_database;
use kds_common::events::EventBus;

/// Command-line arguments for kds-board
#[derive(Parser, Debug)]
#[command(name = "kds-board")]
#[command(about = "Counter order dashboard service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the local database (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kds_board=debug,kds_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = BoardConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.listen_port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    info!("Starting KDS Board on port {}", config.listen_port);
    info!("Data directory: {}", config.data_dir.display());
    info!("Remote order source: {}", config.remote.base_url);

    let db = init_database(&config.db_path())
        .await
        .context("Failed to initialize database")?;

    let events = EventBus::new(100);
    let sink = Arc::new(EventAlertSink::new(events.clone()));
    let notifier = Arc::new(
        NotificationController::new(
            db.clone(),
            events.clone(),
            sink,
            Duration::from_secs(config.alert_repeat_s),
        )
        .await
        .context("Failed to initialize notification controller")?,
    );

    let source = Arc::new(
        HttpOrderSource::new(&config.remote).context("Failed to build remote client")?,
    );
    let board = BoardState::new();
    let snapshot = SnapshotStore::new(db.clone());
    let checklist = ChecklistStore::new(db.clone());

    let poller = Arc::new(OrderPoller::new(
        source.clone(),
        snapshot,
        board.clone(),
        notifier.clone(),
        events.clone(),
        Duration::from_secs(config.poll_interval_s),
    ));
    let poll_task = tokio::spawn(Arc::clone(&poller).run());

    let transition = Arc::new(TransitionService::new(
        source,
        checklist.clone(),
        board.clone(),
        poller.clone(),
        events.clone(),
    ));

    let app = api::create_router(AppState {
        board,
        notifier: notifier.clone(),
        transition,
        checklist,
        poller,
        events,
        sessions: SessionStore::new(config.session_password.clone()),
        port: config.listen_port,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    // Teardown: stop the poll loop and both notification tickers
    poll_task.abort();
    notifier.shutdown().await;
    info!("KDS Board stopped");

    Ok(())
}
