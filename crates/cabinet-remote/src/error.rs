use thiserror::Error;

/// Errors from release resolution and download. "Tag or asset does not
/// exist" is kept distinct from transient network failure so the caller
/// can report which one happened.
#[derive(Debug, Error)]
pub enum RemoteError {
  /// Could not build the HTTP client.
  #[error("failed to build http client: {0}")]
  Client(#[source] reqwest::Error),

  /// Network-level failure while querying the release API.
  #[error("failed to query release '{tag}' of {owner}/{repo}: {source}")]
  Api {
    owner: String,
    repo: String,
    tag: String,
    #[source]
    source: reqwest::Error,
  },

  /// The release API answered, but not with the release (the tag likely
  /// does not exist).
  #[error("release '{tag}' of {owner}/{repo} returned HTTP {status}")]
  ApiStatus {
    owner: String,
    repo: String,
    tag: String,
    status: reqwest::StatusCode,
  },

  /// The release exists but has no asset with the requested name.
  #[error("asset '{0}' not found in the release")]
  AssetNotFound(String),

  /// Network-level failure while downloading the resolved asset.
  #[error("failed to download '{url}': {source}")]
  Download {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The download location answered with a non-success status.
  #[error("download of '{url}' returned HTTP {status}")]
  DownloadStatus {
    url: String,
    status: reqwest::StatusCode,
  },
}

impl RemoteError {
  /// Whether the failure means the requested tag or asset does not exist,
  /// as opposed to an upstream or network problem.
  pub fn is_not_found(&self) -> bool {
    match self {
      RemoteError::AssetNotFound(_) => true,
      RemoteError::ApiStatus { status, .. } | RemoteError::DownloadStatus { status, .. } => {
        *status == reqwest::StatusCode::NOT_FOUND
      }
      _ => false,
    }
  }
}
