use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::Session;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::inventory::{RebuildReport, ReconcileReport};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BaseParams {
    /// Defaults to the caller's base
    pub base_id: Option<String>,
}

/// Compare stored snapshots with the transaction log
#[utoipa::path(
    get,
    path = "/api/v1/inventory/reconcile",
    params(BaseParams),
    responses(
        (status = 200, description = "Per-asset comparison", body = ReconcileReport),
        (status = 403, description = "Admins only", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn reconcile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<BaseParams>,
) -> Result<Json<ReconcileReport>, ServiceError> {
    let base_id = session.scoped_base(params.base_id.as_deref())?;
    Ok(Json(state.services.inventory.reconcile(&base_id).await?))
}

/// Overwrite drifted snapshots with figures projected from the log
#[utoipa::path(
    post,
    path = "/api/v1/inventory/rebuild",
    params(BaseParams),
    responses(
        (status = 200, description = "Asset types rebuilt", body = RebuildReport),
        (status = 403, description = "Admins only", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn rebuild(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<BaseParams>,
) -> Result<Json<RebuildReport>, ServiceError> {
    let base_id = session.scoped_base(params.base_id.as_deref())?;
    Ok(Json(
        state.services.inventory.rebuild(&session, &base_id).await?,
    ))
}
