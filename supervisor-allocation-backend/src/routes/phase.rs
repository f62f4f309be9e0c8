use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use supervisor_allocation_database::Phase;
use supervisor_allocation_engine::PhaseContext;

use crate::caller::Identity;
use crate::error::AppError;
use crate::AppState;

#[derive(Deserialize)]
pub struct PhasePayload {
    phase: Phase,
}

#[derive(Serialize)]
pub struct Versions {
    phase: u64,
    roster: u64,
    selections: u64,
}

pub async fn current(State(state): State<AppState>) -> Json<PhaseContext> {
    Json(state.phase.context())
}

pub async fn change(
    State(state): State<AppState>,
    Identity(caller): Identity,
    payload: Result<Json<PhasePayload>, JsonRejection>,
) -> Result<Json<PhaseContext>, AppError> {
    let Json(payload) = payload?;
    let context = state.phase.set_phase(payload.phase, &caller)?;
    state.persist().await;
    Ok(Json(context))
}

impl Versions {
    pub(crate) fn of(state: &AppState) -> Self {
        state.phase.gate(|context| {
            let stores = state.engine.versions();
            Self {
                phase: context.version,
                roster: stores.roster,
                selections: stores.selections,
            }
        })
    }
}

pub async fn versions(State(state): State<AppState>) -> Json<Versions> {
    Json(Versions::of(&state))
}
