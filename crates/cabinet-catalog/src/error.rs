use thiserror::Error;

/// Errors that can occur while reading or mutating the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
  /// An entry with this id (or its build directory) already exists and
  /// overwrite was not requested.
  #[error("a build with project id '{0}' already exists; set overwrite to replace it")]
  Conflict(String),

  /// No entry with this id exists.
  #[error("no build with project id '{0}'")]
  NotFound(String),

  /// The catalog document could not be parsed. Distinct from `Io` so that
  /// update/delete can refuse to proceed instead of silently dropping data.
  #[error("catalog document is not valid JSON: {0}")]
  Corrupt(#[from] serde_json::Error),

  /// An I/O error while reading or writing the catalog or build tree.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}
