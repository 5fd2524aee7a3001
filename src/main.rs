//! `bike-catalog` - serves one catalog session over HTTP.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use bike_catalog::{init_logging, CatalogApp, Cli, InMemoryAuth, InMemoryDocumentStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_format);
    let config = cli.config();

    let auth = InMemoryAuth::new();
    if let Some(token) = &config.initial_auth_token {
        auth.register_token(token.clone(), token.clone());
    }

    let app = Arc::new(CatalogApp::new(
        &config,
        InMemoryDocumentStore::new(),
        auth,
    )?);
    let session = app.start().await?;
    info!(%session, app_id = %config.app_id, "catalog ready");

    let addr = cli.listen.to_string();
    if let Err(err) = bike_catalog::http::serve(Arc::clone(&app), &addr).await {
        error!(%err, %addr, "http surface stopped");
        app.shutdown().await;
        return Err(err.into());
    }
    app.shutdown().await;
    Ok(())
}
