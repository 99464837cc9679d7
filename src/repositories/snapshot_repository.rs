//! Write-side snapshot helpers. Every function takes the caller's connection
//! so it can run inside the same transaction as the ledger insert.

use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::inventory_snapshot::{self, Column, Entity as InventorySnapshots};
use crate::errors::ServiceError;
use crate::ledger::{AssignmentKind, Movement, SnapshotFigures};

pub async fn find<C: ConnectionTrait>(
    db: &C,
    base_id: &str,
    asset_type: &str,
) -> Result<Option<inventory_snapshot::Model>, ServiceError> {
    InventorySnapshots::find()
        .filter(Column::BaseId.eq(base_id))
        .filter(Column::AssetType.eq(asset_type))
        .one(db)
        .await
        .map_err(ServiceError::db_error)
}

/// Same as [`find`], but takes a row lock until the surrounding transaction
/// ends, so concurrent ledger writes to the row wait for it.
pub async fn find_for_update<C: ConnectionTrait>(
    db: &C,
    base_id: &str,
    asset_type: &str,
) -> Result<Option<inventory_snapshot::Model>, ServiceError> {
    InventorySnapshots::find()
        .filter(Column::BaseId.eq(base_id))
        .filter(Column::AssetType.eq(asset_type))
        .lock_exclusive()
        .one(db)
        .await
        .map_err(ServiceError::db_error)
}

/// Returns the snapshot for (base, asset type), creating an all-zero one if needed.
///
/// Concurrent first writers race on the `(base_id, asset_type)` unique index;
/// the loser's insert is a no-op and both read back the winning row.
pub async fn find_or_create<C: ConnectionTrait>(
    db: &C,
    base_id: &str,
    asset_type: &str,
) -> Result<inventory_snapshot::Model, ServiceError> {
    if let Some(existing) = find(db, base_id, asset_type).await? {
        return Ok(existing);
    }

    insert_blank_if_absent(db, base_id, asset_type).await?;
    find(db, base_id, asset_type).await?.ok_or_else(|| {
        ServiceError::InternalError(format!(
            "Snapshot for {}/{} missing after insert",
            base_id, asset_type
        ))
    })
}

/// Inserts an all-zero row unless one already exists for the pair.
async fn insert_blank_if_absent<C: ConnectionTrait>(
    db: &C,
    base_id: &str,
    asset_type: &str,
) -> Result<(), ServiceError> {
    let now = Utc::now();
    let blank = inventory_snapshot::ActiveModel {
        id: Set(Uuid::new_v4()),
        base_id: Set(base_id.to_string()),
        asset_type: Set(asset_type.to_string()),
        opening_balance: Set(0),
        purchases: Set(0),
        transfer_in: Set(0),
        transfer_out: Set(0),
        assigned: Set(0),
        expended: Set(0),
        closing_balance: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    InventorySnapshots::insert(blank)
        .on_conflict(
            OnConflict::columns([Column::BaseId, Column::AssetType])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(())
}

/// Adds stock to a snapshot, creating it on first use.
pub async fn credit<C: ConnectionTrait>(
    db: &C,
    base_id: &str,
    asset_type: &str,
    movement: Movement,
    quantity: i64,
) -> Result<inventory_snapshot::Model, ServiceError> {
    let snapshot = find_or_create(db, base_id, asset_type).await?;
    apply(db, &snapshot, movement, quantity, false).await?;
    reload(db, snapshot.id).await
}

/// Removes stock from an existing snapshot.
///
/// The decrement is guarded in SQL so two concurrent debits can never take
/// the closing balance below zero.
pub async fn debit<C: ConnectionTrait>(
    db: &C,
    base_id: &str,
    asset_type: &str,
    movement: Movement,
    quantity: i64,
) -> Result<inventory_snapshot::Model, ServiceError> {
    let snapshot = find(db, base_id, asset_type)
        .await?
        .filter(|s| s.closing_balance >= quantity)
        .ok_or_else(insufficient_stock)?;

    if !apply(db, &snapshot, movement, quantity, true).await? {
        return Err(insufficient_stock());
    }
    reload(db, snapshot.id).await
}

/// Replaces the stored counters of a snapshot.
pub async fn overwrite<C: ConnectionTrait>(
    db: &C,
    snapshot: inventory_snapshot::Model,
    figures: &SnapshotFigures,
) -> Result<inventory_snapshot::Model, ServiceError> {
    let mut active: inventory_snapshot::ActiveModel = snapshot.into();
    active.opening_balance = Set(figures.opening_balance);
    active.purchases = Set(figures.purchases);
    active.transfer_in = Set(figures.transfer_in);
    active.transfer_out = Set(figures.transfer_out);
    active.assigned = Set(figures.assigned);
    active.expended = Set(figures.expended);
    active.closing_balance = Set(figures.closing_balance);
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(ServiceError::db_error)
}

fn insufficient_stock() -> ServiceError {
    ServiceError::InsufficientStock("Not enough stock at source base".to_string())
}

fn counter_column(movement: Movement) -> Column {
    match movement {
        Movement::Purchase => Column::Purchases,
        Movement::TransferIn => Column::TransferIn,
        Movement::TransferOut => Column::TransferOut,
        Movement::Assignment(AssignmentKind::Assigned) => Column::Assigned,
        Movement::Assignment(AssignmentKind::Expended) => Column::Expended,
    }
}

/// Bumps the movement counter and shifts the closing balance by the signed
/// quantity. Returns whether a row was updated.
async fn apply<C: ConnectionTrait>(
    db: &C,
    snapshot: &inventory_snapshot::Model,
    movement: Movement,
    quantity: i64,
    guard_stock: bool,
) -> Result<bool, ServiceError> {
    let counter = counter_column(movement);
    let mut update = InventorySnapshots::update_many()
        .col_expr(counter, Expr::col(counter).add(quantity))
        .col_expr(
            Column::ClosingBalance,
            Expr::col(Column::ClosingBalance).add(movement.sign() * quantity),
        )
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(snapshot.id));

    if guard_stock {
        update = update.filter(Column::ClosingBalance.gte(quantity));
    }

    let result = update.exec(db).await.map_err(ServiceError::db_error)?;
    Ok(result.rows_affected == 1)
}

async fn reload<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<inventory_snapshot::Model, ServiceError> {
    InventorySnapshots::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::InternalError(format!("Snapshot {} vanished mid-update", id)))
}
