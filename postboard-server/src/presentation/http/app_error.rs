use crate::domain::error::DomainError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("unauthorized")]
    Unauthorized,
}

pub(crate) type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let plain = |status: StatusCode, error: String| {
            (
                status,
                ErrorBody {
                    error,
                    reason: None,
                },
            )
        };

        match self {
            AppError::Domain(err) => match &err {
                DomainError::Validation { .. } => plain(StatusCode::BAD_REQUEST, err.to_string()),
                DomainError::AlreadyExists(_) => plain(StatusCode::CONFLICT, err.to_string()),
                DomainError::InvalidCredentials => plain(StatusCode::UNAUTHORIZED, err.to_string()),
                DomainError::NotFound(_) => plain(StatusCode::NOT_FOUND, err.to_string()),
                DomainError::Forbidden(reason) => (
                    StatusCode::FORBIDDEN,
                    ErrorBody {
                        error: "forbidden".to_string(),
                        reason: Some(reason.clone()),
                    },
                ),
                DomainError::Unexpected(detail) => {
                    error!(error = %detail, "request failed");
                    plain(StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
                }
            },
            AppError::Validation(err) => plain(StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Unauthorized => plain(StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::AppError;
    use crate::domain::error::DomainError;

    #[test]
    fn forbidden_carries_the_deny_reason() {
        let (status, body) =
            AppError::from(DomainError::Forbidden("orphan comment".to_string())).status_and_body();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.error, "forbidden");
        assert_eq!(body.reason.as_deref(), Some("orphan comment"));
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (
                DomainError::Validation {
                    field: "title",
                    message: "must not be empty",
                },
                StatusCode::BAD_REQUEST,
            ),
            (DomainError::NotFound("post id: 1".to_string()), StatusCode::NOT_FOUND),
            (DomainError::AlreadyExists("email".to_string()), StatusCode::CONFLICT),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED),
        ];
        for (err, expected) in cases {
            let (status, _) = AppError::from(err).status_and_body();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn unexpected_errors_hide_details() {
        let (status, body) =
            AppError::from(DomainError::Unexpected("pool timed out".to_string())).status_and_body();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "internal error");
        assert!(body.reason.is_none());
    }
}
