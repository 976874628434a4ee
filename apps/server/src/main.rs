//! clipdex-server: serves the catalog to the web frontend.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use clipdex_core::{DEFAULT_BUCKET, DEFAULT_CATALOG_OBJECT, StoreConfig, StoreKind};
use clipdex_server::{AppState, build_router};
use tracing::info;

#[derive(Parser)]
#[command(name = "clipdex-server")]
#[command(about = "HTTP API for searching and browsing the clipdex catalog")]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "CLIPDEX_BIND", default_value = "127.0.0.1:8000")]
    bind: String,

    /// Bucket holding the catalog and media
    #[arg(long, env = "BUCKET_NAME", default_value = DEFAULT_BUCKET)]
    bucket: String,

    /// Catalog object name
    #[arg(long, env = "OUTPUT_FILE", default_value = DEFAULT_CATALOG_OBJECT)]
    catalog: String,

    /// Project billed for bucket requests
    #[arg(long, env = "GCP_PROJECT_ID")]
    project: Option<String>,

    /// Service account used to sign playback URLs
    #[arg(long, env = "GCS_SIGNER_EMAIL")]
    signer_email: Option<String>,

    /// Object store backend: gcs or local
    #[arg(long, env = "CLIPDEX_STORE", default_value = "gcs")]
    store: StoreKind,

    /// Root directory of the local store
    #[arg(long, env = "CLIPDEX_LOCAL_ROOT")]
    local_root: Option<PathBuf>,

    /// Base URL serving local store objects
    #[arg(long, env = "CLIPDEX_PUBLIC_BASE_URL")]
    public_base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting clipdex-server v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let store = StoreConfig {
        kind: cli.store,
        bucket: cli.bucket,
        project_id: cli.project,
        signer_email: cli.signer_email,
        local_root: cli.local_root,
        public_base_url: cli.public_base_url,
    }
    .open()
    .await?;
    info!("Serving catalog {}/{}", store.container(), cli.catalog);

    let state = AppState::new(store, cli.catalog);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&cli.bind).await?;
    info!("clipdex-server listening on http://{}", cli.bind);
    info!("Health check: http://{}/health", cli.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
