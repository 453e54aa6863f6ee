use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gigwave_collab::{ErrorKind, GigError};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("Only the artist of this gig can do this")]
    PermissionDenied,
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    FailedPrecondition(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

/// The body of every error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(value_type = String, example = "failed-precondition")]
    kind: ErrorKind,
    message: String,
}

impl ServerError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            Self::Unknown(_) => ErrorKind::Internal,
        }
    }

    fn as_status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::FailedPrecondition => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let Self::Unknown(message) = &self {
            log::error!("Request failed: {}", message);
        }

        let body = ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        };

        (self.as_status_code(), Json(body)).into_response()
    }
}

impl From<GigError> for ServerError {
    fn from(value: GigError) -> Self {
        match value {
            GigError::Unauthenticated => Self::Unauthenticated(value.to_string()),
            GigError::PermissionDenied => Self::PermissionDenied,
            GigError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            GigError::InvalidArgument(message) => Self::InvalidArgument(message),
            GigError::FailedPrecondition(message) => Self::FailedPrecondition(message),
            e => Self::Unknown(e.to_string()),
        }
    }
}
