use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use supervisor_allocation_database::{PersonId, Role};
use supervisor_allocation_engine::Caller;

use crate::error::AppError;
use crate::AppState;

/// Header carrying the id of the person making the request.
pub const CALLER_HEADER: &str = "x-caller-id";

/// The caller of a request, resolved against the person directory. The id is taken as is,
/// authenticating it is left to whatever sits in front of this service.
#[derive(Debug, Clone)]
pub struct Identity(pub Caller);

impl Identity {
    /// Fails with [`AppError::Forbidden`] unless the caller has `role`.
    pub fn require(self, role: Role) -> Result<Caller, AppError> {
        if self.0.role == role {
            Ok(self.0)
        } else {
            Err(AppError::Forbidden(self.0.role))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::MissingCaller)?;
        let person = state
            .engine
            .get_person(&PersonId::from(id))
            .ok_or_else(|| AppError::UnknownCaller(id.to_owned()))?;
        Ok(Self(Caller::of(&person)))
    }
}
