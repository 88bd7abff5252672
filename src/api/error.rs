use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use missionlog_core::{Error, ErrorKind};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] Error),

    /// No caller identity on the request.
    #[error("Missing user identity")]
    Unauthorized,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Core(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::StorageUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Unauthorized => ErrorBody {
                error: "unauthorized",
                message: self.to_string(),
            },
            ApiError::Core(err) if err.kind() == ErrorKind::StorageUnavailable => {
                tracing::error!(error = %err, "Storage failure");
                ErrorBody {
                    error: err.kind().as_str(),
                    message: "Internal server error".to_string(),
                }
            }
            ApiError::Core(err) => ErrorBody {
                error: err.kind().as_str(),
                message: err.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        let cases = [
            (Error::task_not_found(), StatusCode::NOT_FOUND),
            (Error::invalid("bad"), StatusCode::BAD_REQUEST),
            (Error::Conflict("dup".into()), StatusCode::CONFLICT),
            (Error::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (
                Error::StorageUnavailable("poisoned".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn core_messages_pass_through() {
        let err = ApiError::from(Error::invalid("Invalid date format"));
        assert_eq!(err.to_string(), "Invalid date format");
        assert_eq!(ApiError::Unauthorized.to_string(), "Missing user identity");
    }
}
