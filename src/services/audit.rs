use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, QuerySelect, Set};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::audit_log::{self, Entity as AuditLogs};
use crate::errors::ServiceError;

pub const MAX_AUDIT_PAGE: u64 = 500;

/// Audit trail action codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    PurchaseCreated,
    AssetTransfer,
    AssetAssigned,
    AssetExpended,
    SnapshotRebuilt,
}

/// Appends an audit entry on the caller's connection or transaction.
pub async fn record<C: ConnectionTrait>(
    db: &C,
    action: AuditAction,
    user_id: &str,
    details: Value,
) -> Result<audit_log::Model, ServiceError> {
    audit_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        action: Set(action.to_string()),
        user_id: Set(user_id.to_string()),
        details: Set(details),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .map_err(ServiceError::db_error)
}

#[derive(Clone)]
pub struct AuditService {
    db_pool: Arc<DbPool>,
    default_limit: u64,
}

impl AuditService {
    pub fn new(db_pool: Arc<DbPool>, default_limit: u64) -> Self {
        Self {
            db_pool,
            default_limit,
        }
    }

    /// Newest entries first, capped at [`MAX_AUDIT_PAGE`].
    #[instrument(skip(self))]
    pub async fn list_recent(&self, limit: Option<u64>) -> Result<Vec<audit_log::Model>, ServiceError> {
        let limit = limit.unwrap_or(self.default_limit).clamp(1, MAX_AUDIT_PAGE);
        AuditLogs::find()
            .order_by_desc(audit_log::Column::CreatedAt)
            .limit(limit)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}
