use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::entry::{EntryPatch, GameEntry};
use crate::error::CatalogError;

/// Store for the catalog document and the build directory tree it indexes.
///
/// Layout on disk:
/// ```text
/// {data_dir}/
/// ├── games.json
/// └── builds/
///     └── {projectId}/
///         ├── thumbnail.png
///         └── Build/
///             ├── {projectId}.loader.js
///             ├── {projectId}.data
///             ├── {projectId}.framework.js
///             └── {projectId}.wasm
/// ```
///
/// Every mutation is a whole-document read-modify-write of `games.json`.
/// The `write_lock` serializes those cycles within this process; without it
/// two concurrent mutations of the same document race last-writer-wins.
pub struct CatalogStore {
  catalog_path: PathBuf,
  builds_root: PathBuf,
  write_lock: Mutex<()>,
}

impl CatalogStore {
  pub fn new(catalog_path: impl Into<PathBuf>, builds_root: impl Into<PathBuf>) -> Self {
    Self {
      catalog_path: catalog_path.into(),
      builds_root: builds_root.into(),
      write_lock: Mutex::new(()),
    }
  }

  /// Root of the build directory tree.
  pub fn builds_root(&self) -> &Path {
    &self.builds_root
  }

  /// Canonical directory for one project's build.
  pub fn build_dir(&self, id: &str) -> PathBuf {
    self.builds_root.join(id)
  }

  /// Canonical thumbnail path for one project.
  pub fn thumbnail_path(&self, id: &str) -> PathBuf {
    self.build_dir(id).join("thumbnail.png")
  }

  /// Load the full catalog, treating a missing or unreadable document as
  /// empty. Used for listing and for create, where an absent catalog just
  /// means nothing has been published yet.
  pub async fn list(&self) -> Vec<GameEntry> {
    match self.read_strict().await {
      Ok(games) => games,
      Err(e) => {
        debug!("treating catalog as empty: {e}");
        Vec::new()
      }
    }
  }

  /// Load the full catalog, failing on a missing or corrupt document.
  /// Update and delete go through this so a parse failure cannot silently
  /// drop every other entry on the next persist.
  async fn read_strict(&self) -> Result<Vec<GameEntry>, CatalogError> {
    let content = fs::read_to_string(&self.catalog_path).await?;
    let games: Vec<GameEntry> = serde_json::from_str(&content)?;
    Ok(games)
  }

  async fn persist(&self, games: &[GameEntry]) -> Result<(), CatalogError> {
    if let Some(parent) = self.catalog_path.parent() {
      fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(games)?;
    fs::write(&self.catalog_path, content).await?;
    Ok(())
  }

  /// Resolve the overwrite conflict for `id` and return a freshly created
  /// build directory for ingestion to extract into.
  ///
  /// Rejects when a catalog entry or an on-disk build directory for `id`
  /// already exists, unless `overwrite` is set. On overwrite the old
  /// directory is removed recursively (tolerating absence); the old catalog
  /// entry is removed later by [`publish`](Self::publish), so a failed
  /// ingestion between the two leaves an entry pointing at a missing
  /// directory. That window is accepted, not reconciled.
  pub async fn prepare_build_dir(&self, id: &str, overwrite: bool) -> Result<PathBuf, CatalogError> {
    let _guard = self.write_lock.lock().await;

    let dir = self.build_dir(id);
    let dir_exists = fs::try_exists(&dir).await.unwrap_or(false);
    let entry_exists = self.list().await.iter().any(|g| g.id == id);

    if (dir_exists || entry_exists) && !overwrite {
      return Err(CatalogError::Conflict(id.to_string()));
    }

    if dir_exists {
      fs::remove_dir_all(&dir).await?;
    }
    fs::create_dir_all(&dir).await?;
    Ok(dir)
  }

  /// Append a new entry to the catalog and persist it.
  ///
  /// With `overwrite` set, any existing entry with the same id is removed
  /// first, so the final document holds exactly one entry per id. Without
  /// it, a duplicate id is a conflict and the document is left untouched.
  pub async fn publish(&self, entry: GameEntry, overwrite: bool) -> Result<GameEntry, CatalogError> {
    let _guard = self.write_lock.lock().await;

    let mut games = self.list().await;
    if let Some(pos) = games.iter().position(|g| g.id == entry.id) {
      if !overwrite {
        return Err(CatalogError::Conflict(entry.id));
      }
      games.remove(pos);
    }

    games.push(entry.clone());
    self.persist(&games).await?;
    Ok(entry)
  }

  /// Apply a partial update to the entry with `id` and persist the catalog.
  pub async fn update(&self, id: &str, patch: &EntryPatch) -> Result<GameEntry, CatalogError> {
    let _guard = self.write_lock.lock().await;

    let mut games = self.read_strict().await?;
    let entry = games
      .iter_mut()
      .find(|g| g.id == id)
      .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

    patch.apply(entry);
    let updated = entry.clone();
    self.persist(&games).await?;
    Ok(updated)
  }

  /// Remove the build directory and catalog entry for `id`.
  ///
  /// An absent directory is tolerated; an absent entry is too (the
  /// directory may have been the only state left behind by a failed
  /// ingestion).
  pub async fn delete(&self, id: &str) -> Result<(), CatalogError> {
    let _guard = self.write_lock.lock().await;

    let dir = self.build_dir(id);
    match fs::remove_dir_all(&dir).await {
      Ok(()) => {}
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        warn!("no build directory to delete for '{id}'");
      }
      Err(e) => return Err(e.into()),
    }

    let mut games = self.read_strict().await?;
    games.retain(|g| g.id != id);
    self.persist(&games).await?;
    Ok(())
  }
}
