use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QueryTrait, Set,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Session;
use crate::db::DatabaseAccess;
use crate::entities::transfer::{self, Entity as Transfers};
use crate::errors::ServiceError;
use crate::ledger::{Movement, MAX_QUANTITY};
use crate::repositories::snapshot_repository;
use crate::services::audit::{self, AuditAction};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordTransferRequest {
    #[validate(required, length(min = 1, max = 100))]
    #[schema(example = "base-bravo")]
    pub to_base_id: Option<String>,
    #[validate(required, length(min = 1, max = 100))]
    #[schema(example = "Rifle")]
    pub asset_type: Option<String>,
    #[validate(required, range(min = 1, max = 1000000000))]
    #[schema(example = 5)]
    pub quantity: Option<i64>,
}

#[derive(Clone)]
pub struct TransferService {
    db: DatabaseAccess,
}

impl TransferService {
    pub fn new(db: DatabaseAccess) -> Self {
        Self { db }
    }

    /// Moves stock from the caller's base to another base.
    ///
    /// The source must hold at least `quantity`; otherwise nothing is written.
    /// The transfer row, both snapshot updates and the audit entry commit together.
    #[instrument(skip(self, request), fields(from_base_id = %session.base_id, user_id = %session.user_id))]
    pub async fn record(
        &self,
        session: &Session,
        request: RecordTransferRequest,
    ) -> Result<transfer::Model, ServiceError> {
        let (to_base_id, asset_type, quantity) = match (
            request.to_base_id.as_deref().map(str::trim),
            request.asset_type.as_deref().map(str::trim),
            request.quantity,
        ) {
            (Some(to), Some(asset), Some(quantity)) if !to.is_empty() && !asset.is_empty() => {
                (to.to_string(), asset.to_string(), quantity)
            }
            _ => return Err(ServiceError::BadRequest("Missing fields".into())),
        };
        if !(1..=MAX_QUANTITY).contains(&quantity) {
            return Err(ServiceError::BadRequest("Invalid quantity".into()));
        }
        request.validate()?;
        if to_base_id == session.base_id {
            return Err(ServiceError::BadRequest(
                "Source and destination base must differ".into(),
            ));
        }

        let session = session.clone();
        let result = self
            .db
            .transaction::<_, transfer::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    snapshot_repository::debit(
                        txn,
                        &session.base_id,
                        &asset_type,
                        Movement::TransferOut,
                        quantity,
                    )
                    .await?;

                    snapshot_repository::credit(
                        txn,
                        &to_base_id,
                        &asset_type,
                        Movement::TransferIn,
                        quantity,
                    )
                    .await?;

                    let transfer = transfer::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        from_base_id: Set(session.base_id.clone()),
                        to_base_id: Set(to_base_id.clone()),
                        asset_type: Set(asset_type.clone()),
                        quantity: Set(Some(quantity)),
                        recorded_by: Set(session.user_id.clone()),
                        date: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    audit::record(
                        txn,
                        AuditAction::AssetTransfer,
                        &session.user_id,
                        json!({
                            "fromBaseId": session.base_id,
                            "toBaseId": to_base_id,
                            "assetType": asset_type,
                            "quantity": quantity,
                        }),
                    )
                    .await?;

                    Ok(transfer)
                })
            })
            .await;

        match result {
            Ok(transfer) => {
                info!(
                    transfer_id = %transfer.id,
                    to_base_id = %transfer.to_base_id,
                    asset_type = %transfer.asset_type,
                    quantity,
                    "Transfer recorded"
                );
                Ok(transfer)
            }
            Err(e @ ServiceError::InsufficientStock(_)) => {
                warn!(quantity, "Transfer rejected: {}", e);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Admins see every transfer; everyone else those touching their base.
    #[instrument(skip(self), fields(role = %session.role))]
    pub async fn list(&self, session: &Session) -> Result<Vec<transfer::Model>, ServiceError> {
        Transfers::find()
            .apply_if((!session.is_admin()).then_some(&session.base_id), |q, base| {
                q.filter(
                    Condition::any()
                        .add(transfer::Column::FromBaseId.eq(base.as_str()))
                        .add(transfer::Column::ToBaseId.eq(base.as_str())),
                )
            })
            .order_by_desc(transfer::Column::Date)
            .all(self.db.get_pool())
            .await
            .map_err(ServiceError::db_error)
    }
}
