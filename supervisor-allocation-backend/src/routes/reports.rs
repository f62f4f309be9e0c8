//! Exports for administrators once the allocation is done. Any phase is fine, the numbers are
//! simply whatever is committed right now.

use axum::extract::State;
use axum::Json;
use supervisor_allocation_database::Person;
use supervisor_allocation_engine::{Caller, MatchedPair, RosterSummary};

use crate::caller::Identity;
use crate::error::AppError;
use crate::AppState;

fn administrator(Identity(caller): Identity) -> Result<Caller, AppError> {
    if caller.is_administrator() {
        Ok(caller)
    } else {
        Err(AppError::Forbidden(caller.role))
    }
}

pub async fn unmatched(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Person>>, AppError> {
    administrator(identity)?;
    let view = state.engine.view();
    Ok(Json(view.unmatched_students().into_iter().cloned().collect()))
}

pub async fn matches(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<MatchedPair>>, AppError> {
    administrator(identity)?;
    Ok(Json(state.engine.view().matched_pairs()))
}

pub async fn summary(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<RosterSummary>, AppError> {
    administrator(identity)?;
    Ok(Json(state.engine.view().roster_summary()))
}
