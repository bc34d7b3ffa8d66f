mod error;
mod routes;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cabinet_catalog::CatalogStore;
use cabinet_ingest::Ingestor;
use cabinet_remote::ReleaseClient;

use crate::state::AppState;

/// Uploaded archives can carry full builds; keep the limit generous.
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Cabinet - a gallery server for browser-playable WebAssembly builds
#[derive(Parser)]
#[command(name = "cabinet")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.cabinet)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the gallery server
  Serve {
    /// Port to listen on
    #[arg(long, default_value_t = 3001)]
    port: u16,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let cli = Cli::parse();

  let data_dir = cli.data_dir.unwrap_or_else(|| {
    dirs::home_dir()
      .expect("could not determine home directory")
      .join(".cabinet")
  });

  match cli.command {
    Some(Commands::Serve { port }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { serve(data_dir, port).await })
    }
    None => {
      println!("cabinet - use --help to see available commands");
      Ok(())
    }
  }
}

async fn serve(data_dir: PathBuf, port: u16) -> Result<()> {
  let uploads_dir = data_dir.join("uploads");
  tokio::fs::create_dir_all(&uploads_dir)
    .await
    .with_context(|| format!("failed to create uploads dir: {}", uploads_dir.display()))?;

  let builds_root = data_dir.join("builds");
  tokio::fs::create_dir_all(&builds_root)
    .await
    .with_context(|| format!("failed to create builds dir: {}", builds_root.display()))?;

  let store = Arc::new(CatalogStore::new(data_dir.join("games.json"), builds_root));
  let ingestor = Arc::new(Ingestor::new(store.clone()));
  let remote = Arc::new(ReleaseClient::new().context("failed to build release client")?);

  let state = AppState {
    store,
    ingestor,
    remote,
    uploads_dir,
  };

  let app = Router::new()
    .route("/upload", post(routes::upload))
    .route("/games", get(routes::list_games))
    .route("/games/{id}", put(routes::update_game))
    .route("/games/{id}", delete(routes::delete_game))
    .route("/games/{id}/thumbnail", put(routes::update_thumbnail))
    .route("/proxy/github/{owner}/{repo}/{tag}", get(routes::proxy_github))
    .route(
      "/proxy/github/{owner}/{repo}/{tag}/{asset}",
      get(routes::proxy_github_asset),
    )
    .route("/builds/{*path}", get(routes::serve_build_file))
    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
    .layer(CorsLayer::permissive())
    .with_state(state);

  let addr = format!("0.0.0.0:{port}");
  let listener = tokio::net::TcpListener::bind(&addr)
    .await
    .with_context(|| format!("failed to bind {addr}"))?;
  info!("cabinet listening on {addr}");

  axum::serve(listener, app).await.context("server error")
}
