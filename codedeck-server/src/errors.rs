use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use codedeck_collab::{RegistryError, SyncError};
use thiserror::Error;

use crate::execution::ExecutionError;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("Only the room creator can delete this room")]
    NotRoomCreator,
    #[error("Code execution failed: {0}")]
    Execution(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::NotRoomCreator => StatusCode::FORBIDDEN,
            Self::Execution(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.as_status_code(), self.to_string()).into_response()
    }
}

impl From<RegistryError> for ServerError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            RegistryError::Conflict {
                resource,
                field,
                value,
            } => Self::Conflict {
                resource,
                field,
                value,
            },
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<SyncError> for ServerError {
    fn from(value: SyncError) -> Self {
        match value {
            SyncError::RoomNotFound => Self::NotFound {
                resource: "room",
                identifier: "id",
            },
            SyncError::NotRoomCreator => Self::NotRoomCreator,
            SyncError::Registry(e) => e.into(),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<ExecutionError> for ServerError {
    fn from(value: ExecutionError) -> Self {
        Self::Execution(value.to_string())
    }
}
