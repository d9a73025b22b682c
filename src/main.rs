//! Giveaway Bot - event registration over Telegram
//!
//! A chat bot that collects registrants for the active event, plus an
//! admin API for managing events and drawing weighted winners.

mod api;
mod config;
mod db;
mod draw;
mod registration;
mod telegram;

use api::{create_router, AppState};
use config::{ActiveEvent, Config};
use db::Database;
use registration::RegistrationTracker;
use std::net::SocketAddr;
use std::sync::Arc;
use telegram::{Bot, TelegramClient};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "giveaway_bot=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let active_event = Arc::new(ActiveEvent::load(
        &config.active_event_path,
        config.current_event_id,
        &db,
    ));
    tracing::info!(current_event_id = ?active_event.get(), "Active event loaded");

    let cancel = CancellationToken::new();

    // Chat bot
    let poller = match &config.telegram_token {
        Some(token) => {
            let client = TelegramClient::new(&config.telegram_api_url, token)?;
            let bot = Arc::new(Bot::new(
                client,
                RegistrationTracker::new(db.clone()),
                active_event.clone(),
            ));
            Some(tokio::spawn(bot.run(cancel.clone())))
        }
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set; running without the chat bot");
            None
        }
    };

    // Admin API
    let state = AppState::new(db, active_event, config.admin.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Giveaway bot server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
            shutdown.cancel();
        })
        .await?;

    cancel.cancel();
    if let Some(poller) = poller {
        poller.await?;
    }

    Ok(())
}
