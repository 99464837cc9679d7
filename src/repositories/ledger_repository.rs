use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QueryTrait,
};
use std::sync::Arc;
use tracing::debug;

use crate::entities::{assignment, inventory_snapshot, purchase, transfer};
use crate::errors::ServiceError;
use crate::ledger::{
    AssignmentKind, InventorySnapshot, LedgerTransaction, Movement, TransactionCategory,
};
use crate::repositories::Repository;

use super::BaseRepository;

/// Which base (and optionally which single asset type) a read is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerScope {
    pub base_id: String,
    pub asset_type: Option<String>,
}

impl LedgerScope {
    pub fn base(base_id: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            asset_type: None,
        }
    }

    pub fn with_asset_type(mut self, asset_type: Option<String>) -> Self {
        self.asset_type = asset_type.filter(|a| !a.trim().is_empty());
        self
    }
}

/// Source of current inventory snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Snapshots for the scope, ordered by asset type.
    async fn find_snapshots(
        &self,
        scope: &LedgerScope,
    ) -> Result<Vec<InventorySnapshot>, ServiceError>;
}

/// Source of ledger transactions, one category at a time.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Transactions of `category` touching the scope's base, dated at or
    /// after `since` when given.
    async fn find_transactions(
        &self,
        category: TransactionCategory,
        scope: &LedgerScope,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<LedgerTransaction>, ServiceError>;
}

/// SeaORM-backed implementation of both ledger read seams
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    base: BaseRepository,
}

impl LedgerRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

/// Loads one category of ledger rows for the scope on any connection, so the
/// same query can run on the pool or inside a write transaction.
pub async fn load_transactions<C: ConnectionTrait>(
    db: &C,
    category: TransactionCategory,
    scope: &LedgerScope,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<LedgerTransaction>, DbErr> {
    match category {
        TransactionCategory::Purchases => purchases(db, scope, since).await,
        TransactionCategory::TransfersIn => transfers(db, true, scope, since).await,
        TransactionCategory::TransfersOut => transfers(db, false, scope, since).await,
        TransactionCategory::Assignments => assignments(db, scope, since).await,
    }
}

async fn purchases<C: ConnectionTrait>(
    db: &C,
    scope: &LedgerScope,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<LedgerTransaction>, DbErr> {
    let rows = purchase::Entity::find()
        .filter(purchase::Column::BaseId.eq(scope.base_id.as_str()))
        .apply_if(since, |q, since| q.filter(purchase::Column::Date.gte(since)))
        .apply_if(scope.asset_type.as_deref(), |q, asset| {
            q.filter(purchase::Column::AssetType.eq(asset))
        })
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| LedgerTransaction::new(Movement::Purchase, row.asset_type, row.quantity, row.date))
        .collect())
}

async fn transfers<C: ConnectionTrait>(
    db: &C,
    inbound: bool,
    scope: &LedgerScope,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<LedgerTransaction>, DbErr> {
    let (scope_column, movement) = if inbound {
        (transfer::Column::ToBaseId, Movement::TransferIn)
    } else {
        (transfer::Column::FromBaseId, Movement::TransferOut)
    };

    let rows = transfer::Entity::find()
        .filter(scope_column.eq(scope.base_id.as_str()))
        .apply_if(since, |q, since| q.filter(transfer::Column::Date.gte(since)))
        .apply_if(scope.asset_type.as_deref(), |q, asset| {
            q.filter(transfer::Column::AssetType.eq(asset))
        })
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| LedgerTransaction::new(movement, row.asset_type, row.quantity, row.date))
        .collect())
}

async fn assignments<C: ConnectionTrait>(
    db: &C,
    scope: &LedgerScope,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<LedgerTransaction>, DbErr> {
    let rows = assignment::Entity::find()
        .filter(assignment::Column::BaseId.eq(scope.base_id.as_str()))
        .apply_if(since, |q, since| q.filter(assignment::Column::Date.gte(since)))
        .apply_if(scope.asset_type.as_deref(), |q, asset| {
            q.filter(assignment::Column::AssetType.eq(asset))
        })
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let kind = AssignmentKind::from_discriminator(&row.kind);
            LedgerTransaction::new(Movement::Assignment(kind), row.asset_type, row.quantity, row.date)
        })
        .collect())
}

#[async_trait]
impl SnapshotStore for LedgerRepository {
    async fn find_snapshots(
        &self,
        scope: &LedgerScope,
    ) -> Result<Vec<InventorySnapshot>, ServiceError> {
        let rows = inventory_snapshot::Entity::find()
            .filter(inventory_snapshot::Column::BaseId.eq(scope.base_id.as_str()))
            .apply_if(scope.asset_type.as_deref(), |q, asset| {
                q.filter(inventory_snapshot::Column::AssetType.eq(asset))
            })
            .order_by_asc(inventory_snapshot::Column::AssetType)
            .all(self.base.get_db())
            .await
            .map_err(|e| ServiceError::retrieval("inventory snapshots", e))?;

        debug!(base_id = %scope.base_id, count = rows.len(), "Loaded inventory snapshots");
        Ok(rows.into_iter().map(InventorySnapshot::from).collect())
    }
}

#[async_trait]
impl TransactionStore for LedgerRepository {
    async fn find_transactions(
        &self,
        category: TransactionCategory,
        scope: &LedgerScope,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<LedgerTransaction>, ServiceError> {
        load_transactions(self.base.get_db(), category, scope, since)
            .await
            .map(|rows| {
                debug!(%category, base_id = %scope.base_id, count = rows.len(), "Loaded ledger rows");
                rows
            })
            .map_err(|e| ServiceError::retrieval(&category.to_string(), e))
    }
}
