use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::Session;
use crate::entities::assignment;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::assignments::RecordAssignmentRequest;

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentRecorded {
    pub message: String,
    #[schema(value_type = Object)]
    pub assignment: assignment::Model,
}

#[utoipa::path(
    get,
    path = "/api/v1/assignments",
    responses(
        (status = 200, description = "Assignment history"),
        (status = 401, description = "No session", body = crate::errors::ErrorResponse),
        (status = 403, description = "Role not permitted", body = crate::errors::ErrorResponse)
    ),
    tag = "assignments"
)]
pub async fn list_assignments(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<assignment::Model>>, ServiceError> {
    Ok(Json(state.services.assignments.list(&session).await?))
}

/// Assign stock to a unit, or mark it expended
#[utoipa::path(
    post,
    path = "/api/v1/assignments",
    request_body = RecordAssignmentRequest,
    responses(
        (status = 201, description = "Assignment recorded", body = AssignmentRecorded),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Role not permitted", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough stock", body = crate::errors::ErrorResponse)
    ),
    tag = "assignments"
)]
pub async fn create_assignment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<RecordAssignmentRequest>,
) -> Result<(StatusCode, Json<AssignmentRecorded>), ServiceError> {
    let assignment = state.services.assignments.record(&session, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(AssignmentRecorded {
            message: "Assignment recorded successfully".to_string(),
            assignment,
        }),
    ))
}
