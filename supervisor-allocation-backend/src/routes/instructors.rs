use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use supervisor_allocation_database::{InstructorProfile, PersonId};
use supervisor_allocation_engine::{Applications, InstructorOverview, InstructorStats};

use crate::caller::Identity;
use crate::error::AppError;
use crate::AppState;

#[derive(Deserialize)]
pub struct QuotaPayload {
    #[serde(default)]
    select_quota: Option<u32>,
    #[serde(default)]
    confirm_quota: Option<u32>,
}

pub async fn overview(State(state): State<AppState>) -> Json<Vec<InstructorOverview>> {
    Json(state.engine.view().instructor_overview())
}

pub async fn stats(
    State(state): State<AppState>,
    Path(instructor): Path<PersonId>,
) -> Result<Json<InstructorStats>, AppError> {
    state
        .engine
        .view()
        .instructor_stats(&instructor)
        .map(Json)
        .ok_or(AppError::UnknownInstructor(instructor))
}

/// Only the instructor themselves and administrators see who applied.
pub async fn applications(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(instructor): Path<PersonId>,
) -> Result<Json<Applications>, AppError> {
    if !caller.is_administrator() && caller.id != instructor {
        return Err(AppError::Forbidden(caller.role));
    }
    state
        .engine
        .view()
        .applications_for(&instructor)
        .map(Json)
        .ok_or(AppError::UnknownInstructor(instructor))
}

pub async fn quota(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(instructor): Path<PersonId>,
    payload: Result<Json<QuotaPayload>, JsonRejection>,
) -> Result<Json<InstructorProfile>, AppError> {
    let Json(payload) = payload?;
    let profile = state.engine.update_quotas(
        &caller,
        &instructor,
        payload.select_quota,
        payload.confirm_quota,
    )?;
    state.persist().await;
    Ok(Json(profile))
}
