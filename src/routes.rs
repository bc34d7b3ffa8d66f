use std::path::{Component, Path, PathBuf};

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::{Field, Multipart};
use axum::extract::{Path as UrlPath, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use cabinet_ingest::IngestRequest;
use serde_json::json;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Project ids become path components under the build root, so anything
/// that could escape it is rejected up front.
fn validate_project_id(id: &str) -> Result<(), ApiError> {
  let ok = !id.is_empty()
    && id != "."
    && id != ".."
    && id
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
  if ok {
    Ok(())
  } else {
    Err(ApiError::bad_request(
      "projectId may only contain letters, digits, '-', '_' and '.'",
    ))
  }
}

/// Spool one multipart file field to a uniquely named temp file.
async fn spool_field(
  uploads_dir: &Path,
  field: &mut Field<'_>,
  suffix: &str,
) -> Result<PathBuf, ApiError> {
  let path = uploads_dir.join(format!("upload-{}{suffix}", Uuid::new_v4()));
  let mut file = File::create(&path)
    .await
    .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("spool failed: {e}")))?;

  while let Some(chunk) = field
    .chunk()
    .await
    .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
  {
    file
      .write_all(&chunk)
      .await
      .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("spool failed: {e}")))?;
  }
  file
    .flush()
    .await
    .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("spool failed: {e}")))?;
  Ok(path)
}

async fn text_field(field: Field<'_>) -> Result<String, ApiError> {
  field
    .text()
    .await
    .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))
}

async fn remove_quietly(path: Option<&PathBuf>) {
  if let Some(path) = path
    && let Err(e) = tokio::fs::remove_file(path).await
    && e.kind() != std::io::ErrorKind::NotFound
  {
    warn!("failed to remove spooled upload {}: {e}", path.display());
  }
}

/// `POST /upload` — multipart form with the archive, metadata, and an
/// optional thumbnail. Runs the full ingestion pipeline and answers with
/// the created catalog entry.
pub async fn upload(
  State(state): State<AppState>,
  mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
  let mut title: Option<String> = None;
  let mut author: Option<String> = None;
  let mut project_id: Option<String> = None;
  let mut module_code: Option<String> = None;
  let mut overwrite = false;
  let mut archive_path: Option<PathBuf> = None;
  let mut thumbnail_path: Option<PathBuf> = None;

  let result: Result<(), ApiError> = async {
    while let Some(mut field) = multipart
      .next_field()
      .await
      .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
      let name = field.name().map(str::to_string);
      match name.as_deref() {
        Some("title") => title = Some(text_field(field).await?),
        Some("author") => author = Some(text_field(field).await?),
        Some("projectId") => project_id = Some(text_field(field).await?),
        Some("moduleCode") => module_code = Some(text_field(field).await?),
        Some("overwrite") => overwrite = text_field(field).await? == "true",
        Some("zipfile") => {
          archive_path = Some(spool_field(&state.uploads_dir, &mut field, ".zip").await?);
        }
        Some("thumbnail") => {
          thumbnail_path = Some(spool_field(&state.uploads_dir, &mut field, ".png").await?);
        }
        _ => {}
      }
    }
    Ok(())
  }
  .await;

  if let Err(e) = result {
    remove_quietly(archive_path.as_ref()).await;
    remove_quietly(thumbnail_path.as_ref()).await;
    return Err(e);
  }

  let (Some(title), Some(author), Some(project_id), Some(archive_path)) =
    (title, author, project_id, archive_path.clone())
  else {
    remove_quietly(archive_path.as_ref()).await;
    remove_quietly(thumbnail_path.as_ref()).await;
    return Err(ApiError::bad_request(
      "missing required fields: zipfile, title, author and projectId",
    ));
  };
  if let Err(e) = validate_project_id(&project_id) {
    remove_quietly(Some(&archive_path)).await;
    remove_quietly(thumbnail_path.as_ref()).await;
    return Err(e);
  }

  info!("ingesting upload for '{project_id}' (overwrite: {overwrite})");
  let request = IngestRequest {
    project_id,
    title,
    author,
    module_code,
    overwrite,
    archive_path: archive_path.clone(),
    thumbnail_path: thumbnail_path.clone(),
  };

  match state.ingestor.ingest(request).await {
    Ok(entry) => Ok(Json(json!({ "success": true, "game": entry }))),
    Err(e) => {
      remove_quietly(Some(&archive_path)).await;
      remove_quietly(thumbnail_path.as_ref()).await;
      Err(e.into())
    }
  }
}

/// `GET /games` — the full catalog.
pub async fn list_games(State(state): State<AppState>) -> impl IntoResponse {
  Json(state.store.list().await)
}

/// `PUT /games/{id}` — partial metadata update.
pub async fn update_game(
  State(state): State<AppState>,
  UrlPath(id): UrlPath<String>,
  Json(patch): Json<cabinet_catalog::EntryPatch>,
) -> Result<impl IntoResponse, ApiError> {
  let entry = state.store.update(&id, &patch).await?;
  Ok(Json(json!({ "success": true, "game": entry })))
}

/// `PUT /games/{id}/thumbnail` — replace the stored thumbnail.
pub async fn update_thumbnail(
  State(state): State<AppState>,
  UrlPath(id): UrlPath<String>,
  mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
  validate_project_id(&id)?;

  let build_dir = state.store.build_dir(&id);
  if !tokio::fs::try_exists(&build_dir).await.unwrap_or(false) {
    return Err(ApiError::not_found(format!("no build with project id '{id}'")));
  }

  while let Some(mut field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
  {
    if field.name() == Some("thumbnail") {
      let spooled = spool_field(&state.uploads_dir, &mut field, ".png").await?;
      let dest = state.store.thumbnail_path(&id);
      tokio::fs::rename(&spooled, &dest).await.map_err(|e| {
        ApiError::new(
          StatusCode::INTERNAL_SERVER_ERROR,
          format!("failed to store thumbnail: {e}"),
        )
      })?;
      return Ok(Json(
        json!({ "success": true, "thumbnail": format!("/builds/{id}/thumbnail.png") }),
      ));
    }
  }

  Err(ApiError::bad_request("no thumbnail file provided"))
}

/// `DELETE /games/{id}` — remove the build directory and catalog entry.
pub async fn delete_game(
  State(state): State<AppState>,
  UrlPath(id): UrlPath<String>,
) -> Result<impl IntoResponse, ApiError> {
  validate_project_id(&id)?;
  state.store.delete(&id).await?;
  Ok(Json(json!({ "success": true })))
}

/// `GET /proxy/github/{owner}/{repo}/{tag}` — conventional asset name.
pub async fn proxy_github(
  State(state): State<AppState>,
  UrlPath((owner, repo, tag)): UrlPath<(String, String, String)>,
) -> Result<Response, ApiError> {
  proxy_release(state, owner, repo, tag, None).await
}

/// `GET /proxy/github/{owner}/{repo}/{tag}/{asset}` — explicit asset name.
pub async fn proxy_github_asset(
  State(state): State<AppState>,
  UrlPath((owner, repo, tag, asset)): UrlPath<(String, String, String, String)>,
) -> Result<Response, ApiError> {
  proxy_release(state, owner, repo, tag, Some(asset)).await
}

/// Resolve a release archive and stream it through the service, so the
/// browser never talks to the remote host directly.
async fn proxy_release(
  state: AppState,
  owner: String,
  repo: String,
  tag: String,
  asset_name: Option<String>,
) -> Result<Response, ApiError> {
  let resolved = state
    .remote
    .resolve(&owner, &repo, &tag, asset_name.as_deref())
    .await?;
  let response = state.remote.download(&resolved).await?;

  info!("proxying release asset '{}'", resolved.file_name);
  let headers = [
    (
      header::CONTENT_DISPOSITION,
      format!("attachment; filename={}", resolved.file_name),
    ),
    (header::CONTENT_TYPE, "application/zip".to_string()),
  ];
  let body = Body::from_stream(response.bytes_stream());
  Ok((headers, body).into_response())
}

/// `GET /builds/{*path}` — static serving of the build tree.
///
/// Thumbnails are served with no-cache headers so a replaced thumbnail is
/// visible immediately.
pub async fn serve_build_file(
  State(state): State<AppState>,
  UrlPath(path): UrlPath<String>,
) -> Result<Response, ApiError> {
  let relative = PathBuf::from(&path);
  if relative
    .components()
    .any(|c| !matches!(c, Component::Normal(_)))
  {
    return Err(ApiError::bad_request("invalid path"));
  }

  let full = state.store.builds_root().join(&relative);
  let file = File::open(&full).await.map_err(|e| {
    if e.kind() == std::io::ErrorKind::NotFound {
      ApiError::not_found("no such file")
    } else {
      ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("read failed: {e}"))
    }
  })?;

  let mut response = Response::builder().header(header::CONTENT_TYPE, content_type_for(&full));
  if full.file_name().and_then(|n| n.to_str()) == Some("thumbnail.png") {
    response = response.header(
      header::CACHE_CONTROL,
      "no-cache, no-store, must-revalidate",
    );
  }

  let body = Body::from_stream(ReaderStream::new(file));
  response
    .body(body)
    .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

fn content_type_for(path: &Path) -> &'static str {
  match path.extension().and_then(|e| e.to_str()) {
    Some("js") => "application/javascript",
    Some("wasm") => "application/wasm",
    Some("png") => "image/png",
    Some("jpg") | Some("jpeg") => "image/jpeg",
    Some("json") => "application/json",
    Some("html") => "text/html",
    _ => "application/octet-stream",
  }
}
