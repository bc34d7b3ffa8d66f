use std::path::Path;

use tokio::fs;
use tracing::debug;

use crate::error::IngestError;

/// The loader script suffix; the one mandatory artifact, and the one the
/// current base name is derived from.
const LOADER_SUFFIX: &str = ".loader.js";

/// The four artifact suffixes, longest first. Matching longest-first keeps
/// a base name that itself contains a suffix-like substring from being
/// stripped at the wrong point.
const ARTIFACT_SUFFIXES: [&str; 4] = [".framework.js", ".loader.js", ".wasm", ".data"];

/// Rename the build's artifact family to the project id.
///
/// The current base name is derived from the single `*.loader.js` file in
/// `build_dir`; its absence fails the ingestion. If the base name already
/// equals `project_id` nothing is touched. Otherwise each of the four
/// artifacts is renamed if present; missing optional artifacts are skipped.
///
/// Artifacts may still carry a compression suffix at this point
/// (`Proto.wasm.gz`), so each rename also probes the `.gz` and `.br`
/// variants of the suffix.
pub async fn canonicalize_artifacts(build_dir: &Path, project_id: &str) -> Result<(), IngestError> {
  let mut entries = fs::read_dir(build_dir).await?;
  let mut loader: Option<String> = None;

  while let Some(entry) = entries.next_entry().await? {
    if let Some(name) = entry.file_name().to_str()
      && name.ends_with(LOADER_SUFFIX)
    {
      loader = Some(name.to_string());
      break;
    }
  }

  let loader = loader.ok_or(IngestError::LoaderNotFound)?;
  let base = loader
    .strip_suffix(LOADER_SUFFIX)
    .unwrap_or(&loader)
    .to_string();

  if base == project_id {
    debug!("artifacts already named '{project_id}', nothing to rename");
    return Ok(());
  }

  for suffix in ARTIFACT_SUFFIXES {
    for compressed in ["", ".gz", ".br"] {
      let old = build_dir.join(format!("{base}{suffix}{compressed}"));
      if fs::try_exists(&old).await.unwrap_or(false) {
        let new = build_dir.join(format!("{project_id}{suffix}{compressed}"));
        fs::rename(&old, &new).await?;
      }
    }
  }

  Ok(())
}
