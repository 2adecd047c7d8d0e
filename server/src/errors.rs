// storefront_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use storefront::OrderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Order(#[from] OrderError),

  /// A request body or query string that could not be decoded.
  #[error("Malformed request: {0}")]
  BadRequest(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<OrderError>() {
      Ok(order_err) => AppError::Order(order_err),
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

impl AppError {
  /// Stable machine-readable kind, shared with the core's error kinds.
  pub fn kind(&self) -> &'static str {
    match self {
      AppError::Order(e) => e.kind(),
      AppError::BadRequest(_) => "InvalidRequest",
      AppError::Auth(_) => "Unauthenticated",
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Migration(_) | AppError::Internal(_) => "Internal",
    }
  }

  fn public_message(&self) -> String {
    match self {
      // Database and config details stay in the logs.
      AppError::Sqlx(_) | AppError::Migration(_) => "Database operation failed".to_string(),
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Order(OrderError::Internal(_)) | AppError::Order(OrderError::Inconsistent(_)) => {
        "An internal error occurred".to_string()
      }
      other => other.to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Order(e) => match e {
        OrderError::InvalidRequest(_)
        | OrderError::InsufficientStock { .. }
        | OrderError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
        OrderError::ProductNotFound(_) | OrderError::NotFound(_) => StatusCode::NOT_FOUND,
        OrderError::Unauthenticated => StatusCode::UNAUTHORIZED,
        OrderError::Forbidden(_) => StatusCode::FORBIDDEN,
        OrderError::InvalidTransition { .. } => StatusCode::CONFLICT,
        OrderError::Internal(_) | OrderError::Inconsistent(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Migration(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, kind = self.kind(), "Responding with error");
    } else {
      tracing::warn!(application_error = %self, kind = self.kind(), "Responding with error");
    }
    HttpResponse::build(status).json(json!({
      "error": self.kind(),
      "message": self.public_message(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
