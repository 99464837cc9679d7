use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::Session;
use crate::entities::purchase;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::purchases::RecordPurchaseRequest;

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseRecorded {
    pub message: String,
    #[schema(value_type = Object)]
    pub purchase: purchase::Model,
}

/// Purchases visible to the caller, newest first
#[utoipa::path(
    get,
    path = "/api/v1/purchases",
    responses(
        (status = 200, description = "Purchase history"),
        (status = 401, description = "No session", body = crate::errors::ErrorResponse),
        (status = 403, description = "Role not permitted", body = crate::errors::ErrorResponse)
    ),
    tag = "purchases"
)]
pub async fn list_purchases(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<purchase::Model>>, ServiceError> {
    Ok(Json(state.services.purchases.list(&session).await?))
}

/// Record a purchase at the caller's base
#[utoipa::path(
    post,
    path = "/api/v1/purchases",
    request_body = RecordPurchaseRequest,
    responses(
        (status = 201, description = "Purchase recorded", body = PurchaseRecorded),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Role not permitted", body = crate::errors::ErrorResponse)
    ),
    tag = "purchases"
)]
pub async fn create_purchase(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<RecordPurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseRecorded>), ServiceError> {
    let purchase = state.services.purchases.record(&session, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(PurchaseRecorded {
            message: "Purchase recorded successfully".to_string(),
            purchase,
        }),
    ))
}
