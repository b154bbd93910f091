//! feedrelay server
//!
//! A read-only nostr relay that serves RSS, Atom and JSON feeds as signed
//! profiles and notes, one derived keypair per feed.

mod api;
mod config;
mod relay;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use feedrelay_core::config::ConfigStore;
use feedrelay_core::events::live_event_channel;
use feedrelay_core::feed::FeedCache;
use feedrelay_core::processors::{FeedPoller, Replayer};
use feedrelay_core::query::QueryEngine;
use feedrelay_core::source::FeedSource;
use feedrelay_core::store::PgRegistrationStore;
use feedrelay_core::synthesis::Synthesizer;
use feedrelay_core::watermark::EmissionWatermark;
use relay::{LIVE_BROADCAST_CAPACITY, LiveDispatcher, SubscriptionRegistry};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, watch};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// feedrelay - RSS and Atom feeds as a nostr relay
#[derive(Parser, Debug)]
#[command(name = "feedrelay-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./feedrelay-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting feedrelay-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Get database URL from environment
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    // Run migrations if requested
    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // Core components
    let store = Arc::new(PgRegistrationStore::new(db_pool.clone()));
    let feed_cache = Arc::new(FeedCache::new(&loaded_config.feed_cache));
    let source = Arc::new(FeedSource::new(
        store.clone(),
        feed_cache.clone(),
        Synthesizer::new(loaded_config.profile.clone()),
    ));
    let watermark = Arc::new(EmissionWatermark::new());
    let replay_config_store = ConfigStore::new(loaded_config.replay.clone());
    let replayer = Arc::new(Replayer::new(replay_config_store.clone()));
    let query = Arc::new(QueryEngine::new(
        source.clone(),
        watermark.clone(),
        replayer.clone(),
    ));
    let subscriptions = Arc::new(SubscriptionRegistry::new());

    // Channels
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (live_tx, live_rx) = live_event_channel();
    let (broadcast_tx, _) = broadcast::channel(LIVE_BROADCAST_CAPACITY);

    // Create application state
    let state = AppState {
        store,
        feed_cache,
        query,
        subscriptions: subscriptions.clone(),
        live_events: broadcast_tx.clone(),
        identity: Arc::new(loaded_config.identity.clone()),
        settings: Arc::new(RwLock::new(loaded_config.server.clone())),
    };

    // Spawn processors
    let dispatcher_handle = tokio::spawn(
        LiveDispatcher::new(live_rx, broadcast_tx, shutdown_rx.clone()).run(),
    );
    let poller_handle = tokio::spawn(
        FeedPoller::new(
            source,
            watermark,
            replayer,
            subscriptions,
            live_tx,
            loaded_config.poller.clone(),
            shutdown_rx,
        )
        .run(),
    );

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify =
        spawn_config_reload_handler(state.clone(), config_loader, replay_config_store);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop processors and the config reload handler
    let _ = shutdown_tx.send(true);
    shutdown_notify.notify_one();
    for handle in [poller_handle, dispatcher_handle] {
        if let Err(e) = handle.await {
            tracing::error!("Processor task failed: {}", e);
        }
    }

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
