use cabinet_catalog::CatalogError;
use thiserror::Error;

/// Errors that can occur during ingestion. Each pipeline step has its own
/// variant so the caller can report which step failed, not just that one
/// did.
#[derive(Debug, Error)]
pub enum IngestError {
  /// The archive could not be extracted (malformed zip, unsafe entry
  /// path, or I/O failure mid-extraction).
  #[error("failed to extract archive: {0}")]
  Extract(String),

  /// No directory named `Build` exists anywhere in the extracted tree.
  #[error("no 'Build' directory found in the uploaded archive")]
  PayloadNotFound,

  /// Moving the located payload directory to its canonical path failed.
  #[error("failed to relocate 'Build' directory: {0}")]
  Relocate(#[source] std::io::Error),

  /// No `*.loader.js` artifact exists in the payload directory. The
  /// loader is the one mandatory artifact; its absence means the archive
  /// did not contain a valid build.
  #[error("no *.loader.js artifact found in the 'Build' directory")]
  LoaderNotFound,

  /// A precompressed artifact failed to decompress.
  #[error("failed to decompress '{name}': {source}")]
  Decompress {
    name: String,
    #[source]
    source: std::io::Error,
  },

  /// A catalog conflict or persistence failure.
  #[error(transparent)]
  Catalog(#[from] CatalogError),

  /// Any other I/O failure along the pipeline.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl IngestError {
  /// Whether this failure is the caller's fault (conflict, missing or
  /// invalid build in the archive) rather than the server's. Filesystem
  /// failures along the pipeline arrive as `Io`, never `Extract`, so a
  /// full disk is reported as a server fault.
  pub fn is_client_error(&self) -> bool {
    matches!(
      self,
      IngestError::Extract(_)
        | IngestError::PayloadNotFound
        | IngestError::LoaderNotFound
        | IngestError::Catalog(CatalogError::Conflict(_))
    )
  }
}
