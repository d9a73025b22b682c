//! Process configuration and the active-event handle

use crate::db::{Database, EventId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {name} value: {value}")]
    InvalidVar { name: &'static str, value: String },
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings read from the environment at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub port: u16,
    pub active_event_path: PathBuf,
    pub current_event_id: Option<EventId>,
    pub telegram_token: Option<String>,
    pub telegram_api_url: String,
    pub admin: AdminCredentials,
}

/// The single shared dashboard login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = std::env::var("GIVEAWAY_DB_PATH").unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            format!("{home}/.giveaway-bot/giveaway.db")
        });

        let port: u16 = std::env::var("GIVEAWAY_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let current_event_id = match std::env::var("CURRENT_EVENT_ID") {
            Ok(value) if !value.is_empty() => {
                Some(value.parse().map_err(|_| ConfigError::InvalidVar {
                    name: "CURRENT_EVENT_ID",
                    value,
                })?)
            }
            _ => None,
        };

        let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| {
            tracing::warn!(
                "Using default admin username. Set ADMIN_USERNAME in production."
            );
            "admin".to_string()
        });
        let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
            tracing::warn!(
                "Using default admin password. Set ADMIN_PASSWORD in production."
            );
            "password".to_string()
        });

        Ok(Self {
            db_path: PathBuf::from(db_path),
            port,
            active_event_path: std::env::var("GIVEAWAY_CONFIG_PATH")
                .map_or_else(|_| PathBuf::from("config.json"), PathBuf::from),
            current_event_id,
            telegram_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| DEFAULT_TELEGRAM_API_URL.to_string()),
            admin: AdminCredentials { username, password },
        })
    }
}

/// On-disk form of the active-event setting
#[derive(Debug, Default, Serialize, Deserialize)]
struct ActiveEventFile {
    current_event_id: Option<EventId>,
}

/// Which event registrations currently go to.
///
/// Shared by the chat tracker and the dashboard; every change is written
/// back to the config file.
#[derive(Debug)]
pub struct ActiveEvent {
    current: RwLock<Option<EventId>>,
    path: PathBuf,
}

impl ActiveEvent {
    /// Handle that starts with `current` and persists to `path`
    pub fn new(path: impl Into<PathBuf>, current: Option<EventId>) -> Self {
        Self {
            current: RwLock::new(current),
            path: path.into(),
        }
    }

    /// Resolve the active event at startup.
    ///
    /// The config file wins; otherwise the `fallback` id (from the
    /// environment), otherwise the most recently created event. A value
    /// found through a fallback is written back to the file.
    pub fn load(path: impl Into<PathBuf>, fallback: Option<EventId>, db: &Database) -> Self {
        let path = path.into();

        match read_file(&path) {
            Ok(file) if file.current_event_id.is_some() => {
                return Self::new(path, file.current_event_id);
            }
            Ok(_) => {}
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
            }
        }

        let current = fallback.or_else(|| match db.get_last_event() {
            Ok(Some(event)) => Some(event.id),
            Ok(None) => {
                tracing::info!("No events found in database");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to get last event from database");
                None
            }
        });

        let handle = Self::new(path, current);
        if current.is_some() {
            if let Err(e) = handle.persist(current) {
                tracing::error!(error = %e, "Failed to save config file");
            }
        }
        handle
    }

    pub fn get(&self) -> Option<EventId> {
        *self
            .current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Make `event_id` the active event. Persistence failures are logged;
    /// the in-memory value changes regardless.
    pub fn set(&self, event_id: EventId) {
        *self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(event_id);

        match self.persist(Some(event_id)) {
            Ok(()) => tracing::info!(event_id, "Active event changed"),
            Err(e) => tracing::error!(event_id, error = %e, "Failed to save config file"),
        }
    }

    fn persist(&self, current_event_id: Option<EventId>) -> Result<(), ConfigError> {
        let data = serde_json::to_string_pretty(&ActiveEventFile { current_event_id })?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<ActiveEventFile, ConfigError> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
