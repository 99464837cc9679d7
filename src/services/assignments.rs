use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QueryTrait, Set};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Session;
use crate::db::DatabaseAccess;
use crate::entities::assignment::{self, Entity as Assignments};
use crate::errors::ServiceError;
use crate::ledger::{AssignmentKind, Movement};
use crate::repositories::snapshot_repository;
use crate::services::audit::{self, AuditAction};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordAssignmentRequest {
    #[validate(required, length(min = 1, max = 100))]
    #[schema(example = "Ammo")]
    pub asset_type: Option<String>,
    #[validate(required, range(min = 1, max = 1000000000))]
    #[schema(example = 120)]
    pub quantity: Option<i64>,
    /// Unit or person receiving the assets
    #[validate(required, length(min = 1, max = 200))]
    #[schema(example = "2nd Platoon")]
    pub assigned_to: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: AssignmentKind,
}

#[derive(Clone)]
pub struct AssignmentService {
    db: DatabaseAccess,
}

impl AssignmentService {
    pub fn new(db: DatabaseAccess) -> Self {
        Self { db }
    }

    /// Assigns or expends stock held by the caller's base.
    #[instrument(skip(self, request), fields(base_id = %session.base_id, user_id = %session.user_id))]
    pub async fn record(
        &self,
        session: &Session,
        request: RecordAssignmentRequest,
    ) -> Result<assignment::Model, ServiceError> {
        request.validate()?;
        let asset_type = request.asset_type.unwrap_or_default().trim().to_string();
        let assigned_to = request.assigned_to.unwrap_or_default().trim().to_string();
        let quantity = request.quantity.unwrap_or_default();
        let kind = request.kind;

        if asset_type.is_empty() || assigned_to.is_empty() {
            return Err(ServiceError::ValidationError(
                "assetType and assignedTo are required".into(),
            ));
        }

        let action = match kind {
            AssignmentKind::Assigned => AuditAction::AssetAssigned,
            AssignmentKind::Expended => AuditAction::AssetExpended,
        };

        let session = session.clone();
        let assignment = self
            .db
            .transaction::<_, assignment::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    snapshot_repository::debit(
                        txn,
                        &session.base_id,
                        &asset_type,
                        Movement::Assignment(kind),
                        quantity,
                    )
                    .await?;

                    let assignment = assignment::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        base_id: Set(session.base_id.clone()),
                        asset_type: Set(asset_type.clone()),
                        quantity: Set(Some(quantity)),
                        assigned_to: Set(assigned_to.clone()),
                        kind: Set(kind.to_string()),
                        recorded_by: Set(session.user_id.clone()),
                        date: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    audit::record(
                        txn,
                        action,
                        &session.user_id,
                        json!({
                            "baseId": session.base_id,
                            "assetType": asset_type,
                            "quantity": quantity,
                            "assignedTo": assigned_to,
                            "type": kind,
                        }),
                    )
                    .await?;

                    Ok(assignment)
                })
            })
            .await?;

        info!(assignment_id = %assignment.id, kind = %kind, quantity, "Assignment recorded");
        Ok(assignment)
    }

    /// Admins see every assignment; everyone else only their base. Newest first.
    #[instrument(skip(self), fields(role = %session.role))]
    pub async fn list(&self, session: &Session) -> Result<Vec<assignment::Model>, ServiceError> {
        Assignments::find()
            .apply_if((!session.is_admin()).then_some(&session.base_id), |q, base| {
                q.filter(assignment::Column::BaseId.eq(base.as_str()))
            })
            .order_by_desc(assignment::Column::Date)
            .all(self.db.get_pool())
            .await
            .map_err(ServiceError::db_error)
    }
}
