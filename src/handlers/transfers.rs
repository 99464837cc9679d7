use axum::{extract::State, Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::Session;
use crate::entities::transfer;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::transfers::RecordTransferRequest;

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferRecorded {
    pub message: String,
    #[schema(value_type = Object)]
    pub transfer: transfer::Model,
}

/// Transfers into or out of the caller's base, newest first
#[utoipa::path(
    get,
    path = "/api/v1/transfers",
    responses(
        (status = 200, description = "Transfer history"),
        (status = 401, description = "No session", body = crate::errors::ErrorResponse),
        (status = 403, description = "Role not permitted", body = crate::errors::ErrorResponse)
    ),
    tag = "transfers"
)]
pub async fn list_transfers(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<transfer::Model>>, ServiceError> {
    Ok(Json(state.services.transfers.list(&session).await?))
}

/// Move stock from the caller's base to another base
#[utoipa::path(
    post,
    path = "/api/v1/transfers",
    request_body = RecordTransferRequest,
    responses(
        (status = 200, description = "Transfer successful", body = TransferRecorded),
        (status = 400, description = "Missing fields or invalid quantity", body = crate::errors::ErrorResponse),
        (status = 403, description = "Role not permitted", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough stock at source base", body = crate::errors::ErrorResponse)
    ),
    tag = "transfers"
)]
pub async fn create_transfer(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<RecordTransferRequest>,
) -> Result<Json<TransferRecorded>, ServiceError> {
    let transfer = state.services.transfers.record(&session, request).await?;
    Ok(Json(TransferRecorded {
        message: "Transfer successful".to_string(),
        transfer,
    }))
}
