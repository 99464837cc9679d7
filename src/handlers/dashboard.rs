use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::Session;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::ledger::{BalanceLine, DateRange};
use crate::services::dashboard::DashboardQuery;

/// Dashboard filters. Both dates are needed for a historical view;
/// otherwise the current snapshot is returned.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DashboardParams {
    /// Range start, `YYYY-MM-DD` or RFC 3339
    #[param(example = "2024-03-01")]
    pub start_date: Option<String>,
    /// Range end, inclusive through the end of the day
    #[param(example = "2024-03-31")]
    pub end_date: Option<String>,
    #[param(example = "Rifle")]
    pub asset_type: Option<String>,
    /// Admins only; other roles may only name their own base
    pub base_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub dashboard: Vec<BalanceLine>,
}

/// Per-asset-type balances for a base
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    params(DashboardParams),
    responses(
        (status = 200, description = "Balance lines", body = DashboardResponse),
        (status = 400, description = "Malformed or inverted date range", body = crate::errors::ErrorResponse),
        (status = 401, description = "No session", body = crate::errors::ErrorResponse),
        (status = 403, description = "Role or base not permitted", body = crate::errors::ErrorResponse),
        (status = 500, description = "A ledger fetch failed", body = crate::errors::ErrorResponse)
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse>, ServiceError> {
    let base_id = session.scoped_base(params.base_id.as_deref())?;
    let range = DateRange::from_params(params.start_date.as_deref(), params.end_date.as_deref())?;

    let dashboard = state
        .services
        .dashboard
        .dashboard(
            &base_id,
            DashboardQuery {
                asset_type: params.asset_type,
                range,
            },
        )
        .await?;

    Ok(Json(DashboardResponse { dashboard }))
}
