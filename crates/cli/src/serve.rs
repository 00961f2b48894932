//! `abacus serve`: run the HTTP API over an in-memory store.

use std::path::PathBuf;
use std::sync::Arc;

use abacus_server::{start_server, ServerConfig};
use abacus_storage::MemoryStore;
use clap::Args;
use time::Duration;
use tracing::warn;

use crate::{fail, OutputFormat};

#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "ABACUS_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "ABACUS_PORT", default_value = "8001")]
    port: u16,

    /// Secret used to sign tokens. A random one is generated when unset,
    /// which invalidates all tokens on restart.
    #[arg(long, env = "ABACUS_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Access token lifetime in minutes
    #[arg(long, env = "ABACUS_ACCESS_TOKEN_MINUTES", default_value = "30")]
    access_token_minutes: u32,

    /// Refresh token lifetime in days
    #[arg(long, env = "ABACUS_REFRESH_TOKEN_DAYS", default_value = "7")]
    refresh_token_days: u32,

    /// Path to TLS certificate PEM file (requires --tls-key)
    #[arg(long)]
    tls_cert: Option<PathBuf>,

    /// Path to TLS private key PEM file (requires --tls-cert)
    #[arg(long)]
    tls_key: Option<PathBuf>,
}

impl ServeArgs {
    fn into_config(self) -> ServerConfig {
        let jwt_secret = match self.jwt_secret.filter(|s| !s.is_empty()) {
            Some(secret) => secret.into_bytes(),
            None => {
                warn!("ABACUS_JWT_SECRET not set; using a random secret for this process");
                rand::random::<[u8; 32]>().to_vec()
            }
        };
        ServerConfig {
            host: self.host,
            port: self.port,
            jwt_secret,
            access_token_ttl: Duration::minutes(i64::from(self.access_token_minutes)),
            refresh_token_ttl: Duration::days(i64::from(self.refresh_token_days)),
            tls_cert: self.tls_cert,
            tls_key: self.tls_key,
        }
    }
}

pub(crate) fn cmd_serve(args: ServeArgs, output: OutputFormat, quiet: bool) {
    // Validate TLS flags: both must be provided or neither
    if args.tls_cert.is_some() != args.tls_key.is_some() {
        fail(
            "error: --tls-cert and --tls-key must both be provided",
            output,
            quiet,
        );
    }
    if args.access_token_minutes == 0 || args.refresh_token_days == 0 {
        fail("error: token lifetimes must be positive", output, quiet);
    }

    let config = args.into_config();
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => fail(
            &format!("error: failed to create tokio runtime: {}", e),
            output,
            quiet,
        ),
    };
    if let Err(e) = rt.block_on(start_server(Arc::new(MemoryStore::new()), config)) {
        fail(&format!("Server error: {}", e), output, quiet);
    }
}
