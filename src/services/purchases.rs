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
use crate::entities::purchase::{self, Entity as Purchases};
use crate::errors::ServiceError;
use crate::ledger::Movement;
use crate::repositories::snapshot_repository;
use crate::services::audit::{self, AuditAction};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPurchaseRequest {
    #[validate(required, length(min = 1, max = 100))]
    #[schema(example = "Rifle")]
    pub asset_type: Option<String>,
    #[validate(required, range(min = 1, max = 1000000000))]
    #[schema(example = 25)]
    pub quantity: Option<i64>,
}

#[derive(Clone)]
pub struct PurchaseService {
    db: DatabaseAccess,
}

impl PurchaseService {
    pub fn new(db: DatabaseAccess) -> Self {
        Self { db }
    }

    /// Records a purchase for the caller's base and credits its snapshot.
    #[instrument(skip(self, request), fields(base_id = %session.base_id, user_id = %session.user_id))]
    pub async fn record(
        &self,
        session: &Session,
        request: RecordPurchaseRequest,
    ) -> Result<purchase::Model, ServiceError> {
        request.validate()?;
        let asset_type = request.asset_type.unwrap_or_default().trim().to_string();
        let quantity = request.quantity.unwrap_or_default();
        if asset_type.is_empty() {
            return Err(ServiceError::ValidationError("assetType is required".into()));
        }

        let session = session.clone();
        let purchase = self
            .db
            .transaction::<_, purchase::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let purchase = purchase::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        base_id: Set(session.base_id.clone()),
                        asset_type: Set(asset_type.clone()),
                        quantity: Set(Some(quantity)),
                        recorded_by: Set(session.user_id.clone()),
                        date: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    snapshot_repository::credit(
                        txn,
                        &session.base_id,
                        &asset_type,
                        Movement::Purchase,
                        quantity,
                    )
                    .await?;

                    audit::record(
                        txn,
                        AuditAction::PurchaseCreated,
                        &session.user_id,
                        json!({
                            "baseId": session.base_id,
                            "assetType": asset_type,
                            "quantity": quantity,
                        }),
                    )
                    .await?;

                    Ok(purchase)
                })
            })
            .await?;

        info!(purchase_id = %purchase.id, asset_type = %purchase.asset_type, quantity, "Purchase recorded");
        Ok(purchase)
    }

    /// Admins see every purchase; everyone else only their base. Newest first.
    #[instrument(skip(self), fields(role = %session.role))]
    pub async fn list(&self, session: &Session) -> Result<Vec<purchase::Model>, ServiceError> {
        Purchases::find()
            .apply_if((!session.is_admin()).then_some(&session.base_id), |q, base| {
                q.filter(purchase::Column::BaseId.eq(base.as_str()))
            })
            .order_by_desc(purchase::Column::Date)
            .all(self.db.get_pool())
            .await
            .map_err(ServiceError::db_error)
    }
}
