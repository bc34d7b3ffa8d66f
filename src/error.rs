use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cabinet_catalog::CatalogError;
use cabinet_ingest::IngestError;
use cabinet_remote::RemoteError;
use tracing::error;

/// A request failure, rendered as `{ "error": "<message>" }` with an
/// appropriate status. Every failure is recovered here at the request
/// boundary; nothing crashes the process.
#[derive(Debug)]
pub struct ApiError {
  status: StatusCode,
  message: String,
}

impl ApiError {
  pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
    Self {
      status,
      message: message.into(),
    }
  }

  pub fn bad_request(message: impl Into<String>) -> Self {
    Self::new(StatusCode::BAD_REQUEST, message)
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::new(StatusCode::NOT_FOUND, message)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    if self.status.is_server_error() {
      error!("{}", self.message);
    }
    let body = Json(serde_json::json!({ "error": self.message }));
    (self.status, body).into_response()
  }
}

impl From<CatalogError> for ApiError {
  fn from(e: CatalogError) -> Self {
    let status = match &e {
      CatalogError::Conflict(_) => StatusCode::CONFLICT,
      CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
      CatalogError::Corrupt(_) | CatalogError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Self::new(status, e.to_string())
  }
}

impl From<IngestError> for ApiError {
  fn from(e: IngestError) -> Self {
    if let IngestError::Catalog(inner) = e {
      return inner.into();
    }
    let status = if e.is_client_error() {
      StatusCode::BAD_REQUEST
    } else {
      StatusCode::INTERNAL_SERVER_ERROR
    };
    Self::new(status, e.to_string())
  }
}

impl From<RemoteError> for ApiError {
  fn from(e: RemoteError) -> Self {
    let status = if e.is_not_found() {
      StatusCode::NOT_FOUND
    } else {
      StatusCode::BAD_GATEWAY
    };
    Self::new(status, e.to_string())
  }
}
