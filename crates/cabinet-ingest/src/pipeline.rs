use std::path::PathBuf;
use std::sync::Arc;

use cabinet_catalog::{CatalogStore, GameEntry};
use tokio::fs;
use tracing::{info, warn};

use crate::decompress::decompress_dir;
use crate::error::IngestError;
use crate::extract::extract_zip;
use crate::locate::find_payload_dir;
use crate::rename::canonicalize_artifacts;

/// Canonical name of the payload directory inside every build.
pub const PAYLOAD_DIR_NAME: &str = "Build";

/// A validated upload, ready for ingestion. The archive (and optional
/// thumbnail) have already been spooled to temporary files by the HTTP
/// layer.
#[derive(Debug)]
pub struct IngestRequest {
  pub project_id: String,
  pub title: String,
  pub author: String,
  pub module_code: Option<String>,
  pub overwrite: bool,
  pub archive_path: PathBuf,
  pub thumbnail_path: Option<PathBuf>,
}

/// Runs the ingestion pipeline and publishes the resulting entry.
pub struct Ingestor {
  store: Arc<CatalogStore>,
}

impl Ingestor {
  pub fn new(store: Arc<CatalogStore>) -> Self {
    Self { store }
  }

  /// Ingest one uploaded archive end to end.
  ///
  /// Steps run in strict sequence; the catalog entry is only published
  /// once the filesystem side has fully succeeded. A failure after
  /// extraction may leave a partial build directory behind; only the
  /// overwrite path removes prior state, nothing rolls forward state
  /// back.
  pub async fn ingest(&self, req: IngestRequest) -> Result<GameEntry, IngestError> {
    let build_dir = self
      .store
      .prepare_build_dir(&req.project_id, req.overwrite)
      .await?;

    if let Some(thumb) = &req.thumbnail_path {
      fs::rename(thumb, build_dir.join("thumbnail.png")).await?;
    }

    extract_zip(&req.archive_path, &build_dir).await?;

    let search_root = build_dir.clone();
    let found = tokio::task::spawn_blocking(move || find_payload_dir(&search_root))
      .await
      .map_err(std::io::Error::other)?
      .ok_or(IngestError::PayloadNotFound)?;

    let canonical = build_dir.join(PAYLOAD_DIR_NAME);
    if found != canonical {
      fs::rename(&found, &canonical)
        .await
        .map_err(IngestError::Relocate)?;
    }

    canonicalize_artifacts(&canonical, &req.project_id).await?;
    decompress_dir(&canonical).await?;

    let entry = GameEntry::new(req.project_id, req.title, req.author, req.module_code);
    let entry = self.store.publish(entry, req.overwrite).await?;

    if let Err(e) = fs::remove_file(&req.archive_path).await {
      warn!("failed to remove temporary upload: {e}");
    }

    info!("ingested build '{}'", entry.id);
    Ok(entry)
  }
}
