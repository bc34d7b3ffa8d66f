use std::path::PathBuf;
use std::sync::Arc;

use cabinet_catalog::CatalogStore;
use cabinet_ingest::Ingestor;
use cabinet_remote::ReleaseClient;

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<CatalogStore>,
  pub ingestor: Arc<Ingestor>,
  pub remote: Arc<ReleaseClient>,
  /// Spool directory for in-flight multipart uploads.
  pub uploads_dir: PathBuf,
}
