//! Server configuration and shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use abacus_storage::CalculationStore;
use time::Duration;

use crate::auth::TokenIssuer;

/// Runtime configuration for [`crate::start_server`].
#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: Vec<u8>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// PEM files; both or neither. Only honoured with the `tls` feature.
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Application state shared across request handlers.
pub struct AppState {
    pub(crate) store: Arc<dyn CalculationStore>,
    pub(crate) tokens: TokenIssuer,
    /// bcrypt work factor for new password hashes.
    pub(crate) password_cost: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn CalculationStore>, tokens: TokenIssuer) -> Self {
        Self {
            store,
            tokens,
            password_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt cost. Tests use the minimum (4) to stay fast.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }
}
