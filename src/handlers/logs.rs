use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::entities::audit_log;
use crate::errors::ServiceError;
use crate::handlers::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogParams {
    /// Page size, capped at 500
    pub limit: Option<u64>,
}

/// Most recent audit entries
#[utoipa::path(
    get,
    path = "/api/v1/logs",
    params(LogParams),
    responses(
        (status = 200, description = "Audit entries, newest first"),
        (status = 403, description = "Admins only", body = crate::errors::ErrorResponse)
    ),
    tag = "audit"
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<LogParams>,
) -> Result<Json<Vec<audit_log::Model>>, ServiceError> {
    Ok(Json(state.services.audit.list_recent(params.limit).await?))
}
