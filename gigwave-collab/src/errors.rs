use gigwave_core::{GigTransitionError, RequestTransitionError, ScheduleError, SongLimitError, UserId};
use serde::Serialize;
use thiserror::Error;

use crate::DatabaseError;

pub type GigResult<T> = Result<T, GigError>;

/// The broad category of a [GigError], used by surfaces to pick a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Unauthenticated,
    PermissionDenied,
    NotFound,
    InvalidArgument,
    FailedPrecondition,
    Internal,
}

#[derive(Debug, Error)]
pub enum GigError {
    #[error("You must be signed in to do this")]
    Unauthenticated,
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
    #[error(transparent)]
    Internal(DatabaseError),
}

impl GigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::FailedPrecondition(message.into())
    }
}

impl From<DatabaseError> for GigError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            DatabaseError::Stale { resource } => Self::FailedPrecondition(format!(
                "The {} was changed by someone else, try again",
                resource
            )),
            DatabaseError::Conflict { .. } => Self::FailedPrecondition(value.to_string()),
            e => Self::Internal(e),
        }
    }
}

impl From<RequestTransitionError> for GigError {
    fn from(value: RequestTransitionError) -> Self {
        Self::FailedPrecondition(value.to_string())
    }
}

impl From<GigTransitionError> for GigError {
    fn from(value: GigTransitionError) -> Self {
        Self::FailedPrecondition(value.to_string())
    }
}

impl From<SongLimitError> for GigError {
    fn from(value: SongLimitError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

impl From<ScheduleError> for GigError {
    fn from(value: ScheduleError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

/// Who is performing an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User(UserId),
}

impl Caller {
    pub fn user(user_id: impl Into<UserId>) -> Self {
        Self::User(user_id.into())
    }

    /// Returns the signed in user, or fails with [GigError::Unauthenticated]
    pub fn user_id(&self) -> GigResult<&str> {
        match self {
            Self::Anonymous => Err(GigError::Unauthenticated),
            Self::User(id) => Ok(id),
        }
    }
}
