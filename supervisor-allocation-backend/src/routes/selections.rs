use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use supervisor_allocation_database::{PersonId, Role, Selection, SelectionId};
use supervisor_allocation_engine::{Outcome, StudentStatus};

use crate::caller::Identity;
use crate::error::AppError;
use crate::AppState;

#[derive(Deserialize)]
pub struct ApplyPayload {
    instructor: PersonId,
    #[serde(default)]
    rationale: String,
}

#[derive(Serialize)]
pub struct Created {
    id: SelectionId,
}

#[derive(Serialize)]
pub struct Mine {
    #[serde(flatten)]
    status: StudentStatus,
    selection: Option<Selection>,
}

#[derive(Deserialize)]
pub struct DecisionPayload {
    outcome: Outcome,
}

pub async fn apply(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<ApplyPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Created>), AppError> {
    let student = identity.require(Role::Student)?;
    let Json(payload) = payload?;
    let id = state.phase.gate(|context| {
        state
            .engine
            .apply(context, &student.id, &payload.instructor, payload.rationale)
    })?;
    state.persist().await;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn cancel(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<StatusCode, AppError> {
    let student = identity.require(Role::Student)?;
    state
        .phase
        .gate(|context| state.engine.cancel(context, &student.id))?;
    state.persist().await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mine(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Mine>, AppError> {
    let student = identity.require(Role::Student)?;
    let view = state.engine.view();
    let status = view
        .student_status(&student.id)
        .ok_or_else(|| AppError::UnknownStudent(student.id.clone()))?;
    Ok(Json(Mine {
        status,
        selection: view.active_selection_of(&student.id).cloned(),
    }))
}

pub async fn decide(
    State(state): State<AppState>,
    identity: Identity,
    selection: Result<Path<SelectionId>, PathRejection>,
    payload: Result<Json<DecisionPayload>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let instructor = identity.require(Role::Instructor)?;
    let Path(selection) = selection?;
    let Json(payload) = payload?;
    state.phase.gate(|context| {
        state
            .engine
            .decide(context, &selection, &instructor.id, payload.outcome)
    })?;
    state.persist().await;
    Ok(StatusCode::NO_CONTENT)
}
