//! HTTP error mapping.
//!
//! Every failure leaves the server as a `{success: false, error}` envelope. Storage faults are
//! logged in full but reported to the client only as "Internal error".

use api_shared::ApiResponse;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use oss_files::FilesError;
use tokio::task::JoinError;

/// Client-facing reason when the request carries no `file` part.
pub const NO_FILE_PART: &str = "No file part";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("File not found")]
    FileNotFound,
    #[error("Not found")]
    RouteNotFound,
    #[error("Uploaded file exceeds the size limit")]
    PayloadTooLarge,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::FileNotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FilesError> for ApiError {
    fn from(err: FilesError) -> Self {
        match err {
            FilesError::NotFound(_) => Self::FileNotFound,
            err if err.is_client_error() => Self::BadRequest(err.to_string()),
            err => Self::Internal(err.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge,
            status if status.is_client_error() => Self::BadRequest(err.body_text()),
            _ => Self::Internal(err.body_text()),
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self::Internal(format!("storage task failed: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                "Internal error".to_string()
            }
            other => {
                tracing::debug!(error = %other, "request rejected");
                other.to_string()
            }
        };

        (self.status(), Json(ApiResponse::<()>::failure(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_error_mapping() {
        assert!(matches!(
            ApiError::from(FilesError::NotFound("x".into())),
            ApiError::FileNotFound
        ));
        assert!(matches!(
            ApiError::from(FilesError::MissingFilename),
            ApiError::BadRequest(msg) if msg == "No selected file"
        ));
        assert!(matches!(
            ApiError::from(FilesError::InvalidName("../x".into())),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(FilesError::Io(std::io::Error::other("disk full"))),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::FileNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::BadRequest(NO_FILE_PART.into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
