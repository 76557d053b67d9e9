//! User service binary.
//!
//! Reads `config/veneer.toml` (or the path in `VENEER_CONFIG`), applies
//! `.env` and `VENEER__*` environment overrides and serves until SIGTERM or SIGINT.

use std::sync::Arc;

use anyhow::Context;
use veneer::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::var("VENEER_CONFIG").unwrap_or_else(|_| user_service::CONFIG_PATH.to_string());
    let config = ConfigLoader::new()
        .with_defaults()
        .with_file(&path)
        .with_context(|| format!("loading {path}"))?
        .with_dotenv()?
        .with_env_prefix("VENEER")
        .load()?;

    init_logging(&config.logging.to_log_config())?;
    tracing::info!(config = %path, addr = %config.server.http_addr, "starting user service");

    let server_config = config.server.clone();
    let app = user_service::build_app(config)?;
    Server::new(Arc::new(app), &server_config).run().await?;
    Ok(())
}
