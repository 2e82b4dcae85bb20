//! Warden - stateless token authentication for HTTP APIs

use anyhow::{Context, Result};
use chrono::Duration;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{BootstrapConfig, Config};
use warden_api::{AppState, create_router};
use warden_auth::{SigningKey, TokenCodec, hash_password};
use warden_db::{Database, NewUser, ROLE_ADMIN, ROLE_USER};

/// Warden - stateless token authentication for HTTP APIs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "WARDEN_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "WARDEN_PORT")]
    port: Option<u16>,

    /// Base64-encoded token signing secret
    #[arg(long, env = "WARDEN_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(secret) = args.jwt_secret {
        config.jwt.secret = secret;
    }
    config.validate()?;

    init_logging(&config.logging.level, &config.logging.format);

    info!("Starting Warden v{}", env!("CARGO_PKG_VERSION"));

    // Without a usable key no token can be issued or verified, so refuse to start.
    let key = SigningKey::from_base64(&config.jwt.secret)
        .context("Invalid jwt.secret (expected base64 encoding at least 64 bytes)")?;
    let validity = Duration::try_seconds(config.jwt.token_validity_in_seconds)
        .context("jwt.token_validity_in_seconds is out of range")?;
    let codec = Arc::new(TokenCodec::new(key, validity));

    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let db_url = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_url).await?;

    bootstrap_admin(&db, &config.bootstrap).await?;

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;

    let state = AppState::new(db, codec);
    let app = create_router(state, Some(Arc::new(metrics_handle))).layer(TraceLayer::new_for_http());

    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);
    info!(
        "Token validity: {}s",
        config.jwt.token_validity_in_seconds
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Create the initial administrator if no users exist
async fn bootstrap_admin(db: &Database, bootstrap: &BootstrapConfig) -> Result<()> {
    if !bootstrap.enabled || db.has_users().await? {
        return Ok(());
    }

    info!("Creating initial admin user");
    let password_hash = hash_password(&bootstrap.password)?;
    db.insert_user(NewUser {
        username: bootstrap.username.clone(),
        password_hash,
        nickname: bootstrap.username.clone(),
        activated: true,
        authorities: vec![ROLE_USER.to_string(), ROLE_ADMIN.to_string()],
    })
    .await?;
    warn!(
        "Initial admin user '{}' created with the configured bootstrap password; change it",
        bootstrap.username
    );
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
