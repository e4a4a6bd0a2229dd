//! Main entry point for the medibook platform.
//!
//! Resolves configuration from the environment, establishes the document
//! store (with bounded-backoff retry), and serves the REST API.

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, TokenService, DEFAULT_TOKEN_TTL_DAYS};
use medibook_core::{CoreConfig, RetryPolicy, Store};

/// Starts the medibook REST server.
///
/// # Environment Variables
/// - `MEDIBOOK_REST_ADDR`: server address (default: "0.0.0.0:5000")
/// - `MEDIBOOK_DATA_DIR`: document store root (default: "/medibook_data")
/// - `MEDIBOOK_TOKEN_SECRET`: bearer-token signing key (required)
/// - `MEDIBOOK_TOKEN_TTL_DAYS`: credential lifetime (default: 30)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or the running server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medibook=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDIBOOK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".into());
    let data_dir = std::env::var("MEDIBOOK_DATA_DIR").unwrap_or_else(|_| "/medibook_data".into());
    let secret = std::env::var("MEDIBOOK_TOKEN_SECRET")
        .map_err(|_| anyhow::anyhow!("MEDIBOOK_TOKEN_SECRET must be set"))?;
    let ttl_days = match std::env::var("MEDIBOOK_TOKEN_TTL_DAYS") {
        Ok(raw) => raw.parse()?,
        Err(_) => DEFAULT_TOKEN_TTL_DAYS,
    };

    tracing::info!("++ Starting medibook REST on {}", addr);
    tracing::info!("++ Document store at {}", data_dir);

    let cfg = Arc::new(CoreConfig::new(PathBuf::from(data_dir)));
    let store = Arc::new(Store::open(cfg, RetryPolicy::default())?);

    let state = AppState::new(store, TokenService::new(secret.as_bytes(), ttl_days));
    let app = api_rest::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
