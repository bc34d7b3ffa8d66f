use serde::Deserialize;
use tracing::debug;

use crate::error::RemoteError;

const USER_AGENT: &str = concat!("cabinet/", env!("CARGO_PKG_VERSION"));
const API_BASE: &str = "https://api.github.com";
const DOWNLOAD_BASE: &str = "https://github.com";

/// Release metadata as returned by the GitHub API; only the asset list is
/// of interest here.
#[derive(Debug, Deserialize)]
struct Release {
  assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
  name: String,
  browser_download_url: String,
}

/// A resolved, downloadable archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
  /// File name to suggest in the attachment disposition.
  pub file_name: String,
  pub download_url: String,
}

/// Client for resolving and downloading release assets.
pub struct ReleaseClient {
  http: reqwest::Client,
  api_base: String,
  download_base: String,
}

impl ReleaseClient {
  pub fn new() -> Result<Self, RemoteError> {
    let http = reqwest::Client::builder()
      .user_agent(USER_AGENT)
      .build()
      .map_err(RemoteError::Client)?;
    Ok(Self {
      http,
      api_base: API_BASE.to_string(),
      download_base: DOWNLOAD_BASE.to_string(),
    })
  }

  /// Point the client at different API/download hosts. Used by tests.
  pub fn with_bases(mut self, api_base: impl Into<String>, download_base: impl Into<String>) -> Self {
    self.api_base = api_base.into();
    self.download_base = download_base.into();
    self
  }

  /// Resolve a release coordinate to a concrete download location.
  ///
  /// With an asset name the release metadata is queried and searched for
  /// an exact match. Without one, the conventional `{repo}-{tag}.zip`
  /// location is constructed directly and no API call is made.
  pub async fn resolve(
    &self,
    owner: &str,
    repo: &str,
    tag: &str,
    asset_name: Option<&str>,
  ) -> Result<ResolvedAsset, RemoteError> {
    let asset_name = asset_name.map(str::trim).filter(|s| !s.is_empty());

    let Some(wanted) = asset_name else {
      let file_name = format!("{repo}-{tag}.zip");
      let download_url = format!(
        "{}/{owner}/{repo}/releases/download/{tag}/{file_name}",
        self.download_base
      );
      return Ok(ResolvedAsset {
        file_name,
        download_url,
      });
    };

    let url = format!(
      "{}/repos/{owner}/{repo}/releases/tags/{tag}",
      self.api_base
    );
    debug!("looking up release: {url}");

    let response = self
      .http
      .get(&url)
      .send()
      .await
      .map_err(|source| RemoteError::Api {
        owner: owner.to_string(),
        repo: repo.to_string(),
        tag: tag.to_string(),
        source,
      })?;

    if !response.status().is_success() {
      return Err(RemoteError::ApiStatus {
        owner: owner.to_string(),
        repo: repo.to_string(),
        tag: tag.to_string(),
        status: response.status(),
      });
    }

    let release: Release = response.json().await.map_err(|source| RemoteError::Api {
      owner: owner.to_string(),
      repo: repo.to_string(),
      tag: tag.to_string(),
      source,
    })?;

    let asset = release
      .assets
      .into_iter()
      .find(|a| a.name == wanted)
      .ok_or_else(|| RemoteError::AssetNotFound(wanted.to_string()))?;

    Ok(ResolvedAsset {
      file_name: asset.name,
      download_url: asset.browser_download_url,
    })
  }

  /// Start downloading a resolved asset. The response body is a byte
  /// stream suitable for proxying straight to the browser.
  pub async fn download(&self, asset: &ResolvedAsset) -> Result<reqwest::Response, RemoteError> {
    let response = self
      .http
      .get(&asset.download_url)
      .send()
      .await
      .map_err(|source| RemoteError::Download {
        url: asset.download_url.clone(),
        source,
      })?;

    if !response.status().is_success() {
      return Err(RemoteError::DownloadStatus {
        url: asset.download_url.clone(),
        status: response.status(),
      });
    }

    Ok(response)
  }
}

#[cfg(test)]
mod tests {
  use tokio::io::{AsyncReadExt, AsyncWriteExt};

  use super::*;

  /// Serve one canned HTTP response on a local listener and return the
  /// base URL to point the client at.
  async fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = [0u8; 4096];
      let _ = socket.read(&mut buf).await;
      let response = format!(
        "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
      );
      socket.write_all(response.as_bytes()).await.unwrap();
      let _ = socket.shutdown().await;
    });

    format!("http://{addr}")
  }

  #[tokio::test]
  async fn named_asset_resolves_to_its_download_url() {
    let api = serve_once(
      "200 OK",
      r#"{
        "tag_name": "v1.2",
        "assets": [
          {"name": "space-run-native.zip", "browser_download_url": "https://example.com/dl/native"},
          {"name": "space-run-webgl.zip", "browser_download_url": "https://example.com/dl/webgl"}
        ]
      }"#,
    )
    .await;
    let client = ReleaseClient::new()
      .unwrap()
      .with_bases(api, "https://github.com");

    let asset = client
      .resolve("someone", "space-run", "v1.2", Some("space-run-webgl.zip"))
      .await
      .unwrap();

    assert_eq!(asset.file_name, "space-run-webgl.zip");
    assert_eq!(asset.download_url, "https://example.com/dl/webgl");
  }

  #[tokio::test]
  async fn missing_asset_in_release_is_asset_not_found() {
    let api = serve_once(
      "200 OK",
      r#"{"tag_name": "v1.2", "assets": [{"name": "other.zip", "browser_download_url": "https://example.com/dl/other"}]}"#,
    )
    .await;
    let client = ReleaseClient::new()
      .unwrap()
      .with_bases(api, "https://github.com");

    let err = client
      .resolve("someone", "space-run", "v1.2", Some("space-run-webgl.zip"))
      .await
      .unwrap_err();

    assert!(matches!(&err, RemoteError::AssetNotFound(name) if name == "space-run-webgl.zip"));
    assert!(err.is_not_found());
  }

  #[tokio::test]
  async fn unknown_tag_surfaces_api_status() {
    let api = serve_once("404 Not Found", r#"{"message": "Not Found"}"#).await;
    let client = ReleaseClient::new()
      .unwrap()
      .with_bases(api, "https://github.com");

    let err = client
      .resolve("someone", "space-run", "v0.0", Some("space-run-webgl.zip"))
      .await
      .unwrap_err();

    assert!(
      matches!(&err, RemoteError::ApiStatus { status, .. } if *status == reqwest::StatusCode::NOT_FOUND)
    );
    assert!(err.is_not_found());
  }

  #[tokio::test]
  async fn upstream_api_error_is_not_mistaken_for_not_found() {
    let api = serve_once("500 Internal Server Error", r#"{"message": "boom"}"#).await;
    let client = ReleaseClient::new()
      .unwrap()
      .with_bases(api, "https://github.com");

    let err = client
      .resolve("someone", "space-run", "v1.2", Some("space-run-webgl.zip"))
      .await
      .unwrap_err();

    assert!(matches!(&err, RemoteError::ApiStatus { .. }));
    assert!(!err.is_not_found());
  }

  #[tokio::test]
  async fn conventional_url_needs_no_api_call() {
    // Unroutable api base: resolution must succeed without touching it.
    let client = ReleaseClient::new()
      .unwrap()
      .with_bases("http://127.0.0.1:1", "https://github.com");

    let asset = client
      .resolve("someone", "space-run", "v1.2", None)
      .await
      .unwrap();

    assert_eq!(asset.file_name, "space-run-v1.2.zip");
    assert_eq!(
      asset.download_url,
      "https://github.com/someone/space-run/releases/download/v1.2/space-run-v1.2.zip"
    );
  }

  #[tokio::test]
  async fn blank_asset_name_falls_back_to_convention() {
    let client = ReleaseClient::new()
      .unwrap()
      .with_bases("http://127.0.0.1:1", "https://github.com");

    let asset = client
      .resolve("someone", "space-run", "v1.2", Some("  "))
      .await
      .unwrap();

    assert_eq!(asset.file_name, "space-run-v1.2.zip");
  }

  #[test]
  fn release_json_parses_asset_list() {
    let release: Release = serde_json::from_str(
      r#"{
        "tag_name": "v1.2",
        "assets": [
          {"name": "space-run-webgl.zip", "browser_download_url": "https://example.com/dl/1"},
          {"name": "space-run-native.zip", "browser_download_url": "https://example.com/dl/2"}
        ]
      }"#,
    )
    .unwrap();

    assert_eq!(release.assets.len(), 2);
    assert_eq!(release.assets[0].name, "space-run-webgl.zip");
  }
}
