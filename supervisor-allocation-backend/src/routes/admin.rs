use axum::extract::State;
use axum::Json;

use crate::caller::Identity;
use crate::error::AppError;
use crate::routes::phase::Versions;
use crate::AppState;

/// Drops every selection, restores the roster and goes back to the initial phase.
pub async fn reset(
    State(state): State<AppState>,
    Identity(caller): Identity,
) -> Result<Json<Versions>, AppError> {
    state
        .phase
        .set_phase_after(state.initial_phase, &caller, || state.engine.reset(&caller))?;
    state.persist().await;
    Ok(Json(Versions::of(&state)))
}
