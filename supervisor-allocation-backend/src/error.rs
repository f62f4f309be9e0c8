use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use supervisor_allocation_config::ConfigError;
use supervisor_allocation_database::{DatabaseError, PersonId, Role};
use supervisor_allocation_engine::{AdminError, ApplyError, CancelError, DecideError, ErrorKind};
use tracing::{debug, error};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Apply(#[from] ApplyError),
    #[error("{0}")]
    Cancel(#[from] CancelError),
    #[error("{0}")]
    Decide(#[from] DecideError),
    #[error("{0}")]
    Admin(#[from] AdminError),
    #[error("no student with id {0}")]
    UnknownStudent(PersonId),
    #[error("no instructor with id {0}")]
    UnknownInstructor(PersonId),
    #[error("missing x-caller-id header")]
    MissingCaller,
    #[error("unknown caller {0}")]
    UnknownCaller(String),
    #[error("not available to the {0:?} role")]
    Forbidden(Role),
    #[error("invalid request body: {0}")]
    Json(#[from] JsonRejection),
    #[error("invalid path: {0}")]
    Path(#[from] PathRejection),
    #[error("storage error: {0}")]
    Database(#[from] DatabaseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// The engine category of this error, `None` for errors outside of the allocation rules.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Apply(error) => Some(error.kind()),
            Self::Cancel(error) => Some(error.kind()),
            Self::Decide(error) => Some(error.kind()),
            Self::Admin(error) => Some(error.kind()),
            Self::UnknownStudent(_) | Self::UnknownInstructor(_) => Some(ErrorKind::NotFound),
            Self::Forbidden(_) => Some(ErrorKind::Unauthorized),
            Self::MissingCaller
            | Self::UnknownCaller(_)
            | Self::Json(_)
            | Self::Path(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Config(_) => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
            Some(ErrorKind::Unauthorized) => StatusCode::FORBIDDEN,
            Some(
                ErrorKind::PhaseNotOpen
                | ErrorKind::DuplicateActiveSelection
                | ErrorKind::QuotaExceeded
                | ErrorKind::NotCancelable
                | ErrorKind::InvalidTransition,
            ) => StatusCode::CONFLICT,
            None => match self {
                Self::MissingCaller | Self::UnknownCaller(_) => StatusCode::UNAUTHORIZED,
                Self::Json(_) | Self::Path(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {self}");
        } else {
            debug!(%status, "request rejected: {self}");
        }
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}
