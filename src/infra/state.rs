//! Global application state.
//!
//! Used for access to common resources such as the
//! configuration or the item store.

use super::config::Config;
use crate::feature::item::item_repository::ItemStore;
use axum::extract::FromRef;
use std::time::{Duration, Instant};

/// Global application state.
#[derive(Clone, Debug, FromRef)]
pub struct AppState {
    config: Config,
    items: ItemStore,
    #[from_ref(skip)]
    started_at: Instant,
}

impl AppState {
    /// Constructs a new [`AppState`].
    pub fn new(config: Config, items: ItemStore) -> Self {
        Self {
            config,
            items,
            started_at: Instant::now(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// How long the service has been running.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
