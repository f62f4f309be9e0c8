use axum::extract::{Path, State};
use axum::Json;
use supervisor_allocation_database::PersonId;
use supervisor_allocation_engine::StudentStatus;

use crate::error::AppError;
use crate::AppState;

pub async fn status(
    State(state): State<AppState>,
    Path(student): Path<PersonId>,
) -> Result<Json<StudentStatus>, AppError> {
    state
        .engine
        .view()
        .student_status(&student)
        .map(Json)
        .ok_or(AppError::UnknownStudent(student))
}
