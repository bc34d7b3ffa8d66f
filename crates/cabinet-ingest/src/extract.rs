use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::error::IngestError;

/// Extract a zip archive into `dest`, preserving relative paths.
///
/// Entries whose names escape `dest` (absolute paths, `..` components) are
/// rejected rather than skipped; a tampered archive fails the whole
/// ingestion. The zip format requires random access, so the work runs on
/// the blocking pool.
pub async fn extract_zip(archive: &Path, dest: &Path) -> Result<(), IngestError> {
  let archive = archive.to_path_buf();
  let dest = dest.to_path_buf();
  tokio::task::spawn_blocking(move || extract_blocking(&archive, &dest))
    .await
    .map_err(|e| IngestError::Extract(format!("extraction task panicked: {e}")))?
}

fn extract_blocking(archive_path: &Path, dest: &Path) -> Result<(), IngestError> {
  let file = File::open(archive_path)?;
  let mut archive =
    ZipArchive::new(file).map_err(|e| IngestError::Extract(format!("invalid zip: {e}")))?;

  for i in 0..archive.len() {
    let mut entry = archive
      .by_index(i)
      .map_err(|e| IngestError::Extract(format!("invalid zip entry: {e}")))?;

    let relative: PathBuf = match entry.enclosed_name() {
      Some(p) => p,
      None => {
        return Err(IngestError::Extract(format!(
          "unsafe entry path '{}'",
          entry.name()
        )));
      }
    };
    let out_path = dest.join(relative);

    if entry.is_dir() {
      std::fs::create_dir_all(&out_path)?;
    } else {
      if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
      }
      let mut out = File::create(&out_path)?;
      std::io::copy(&mut entry, &mut out)?;
    }
  }

  debug!("extracted {} entries to {}", archive.len(), dest.display());
  Ok(())
}
