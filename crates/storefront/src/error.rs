//! Errors of the read routes, and the Sentry helpers the routes share.
//!
//! Read routes return `Result<T, AppError>`. Action routes answer with an
//! `ActionOutcome` and never produce an `AppError`. Both use the same
//! `{success, message}` body so clients parse one shape.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::outcome::{ActionResponse, UNKNOWN_ERROR};

/// Failure of a read route.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// The signed-in user has no such record.
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// What the client sees. Server-side detail stays in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found.".to_owned(),
            Self::Database(_) => UNKNOWN_ERROR.to_owned(),
            Self::NotFound(what) => format!("{what} not found."),
            Self::BadRequest(message) => message.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ActionResponse {
            success: false,
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Attach the signed-in user to subsequent Sentry events.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

/// Record an account action as a Sentry breadcrumb.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let data = data
        .iter()
        .map(|(key, value)| ((*key).to_owned(), serde_json::Value::String(value.clone())))
        .collect();

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        data,
        ..Default::default()
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn respond(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = respond(AppError::NotFound("order 42".to_owned())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            serde_json::json!({ "success": false, "message": "order 42 not found." })
        );
    }

    #[tokio::test]
    async fn test_database_detail_is_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad email".to_owned()));
        let (status, body) = respond(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Unknown error.");
    }

    #[test]
    fn test_repository_status_mapping() {
        assert_eq!(
            AppError::Database(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(RepositoryError::Conflict("username".to_owned())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::BadRequest("weight must be positive".to_owned()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
