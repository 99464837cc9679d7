use sea_orm::ConnectionTrait;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::Session;
use crate::db::DatabaseAccess;
use crate::errors::ServiceError;
use crate::ledger::{self, LedgerTransaction, SnapshotFigures, TransactionCategory};
use crate::repositories::{
    load_transactions, snapshot_repository, LedgerScope, SnapshotStore, TransactionStore,
};
use crate::services::audit::{self, AuditAction};

/// Stored counters next to what the full ledger says they should be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDrift {
    pub asset_type: String,
    pub stored: SnapshotFigures,
    pub projected: SnapshotFigures,
    pub in_sync: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub base_id: String,
    pub snapshots: Vec<SnapshotDrift>,
}

impl ReconcileReport {
    pub fn drifted(&self) -> impl Iterator<Item = &SnapshotDrift> {
        self.snapshots.iter().filter(|d| !d.in_sync)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RebuildReport {
    pub base_id: String,
    pub rebuilt: Vec<String>,
}

/// Compares snapshots against the transaction log and repairs drift.
#[derive(Clone)]
pub struct InventoryService {
    db: DatabaseAccess,
    snapshots: Arc<dyn SnapshotStore>,
    transactions: Arc<dyn TransactionStore>,
}

impl InventoryService {
    pub fn new(
        db: DatabaseAccess,
        snapshots: Arc<dyn SnapshotStore>,
        transactions: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            db,
            snapshots,
            transactions,
        }
    }

    #[instrument(skip(self))]
    pub async fn reconcile(&self, base_id: &str) -> Result<ReconcileReport, ServiceError> {
        let scope = LedgerScope::base(base_id);
        let tx = &self.transactions;
        let (snapshots, purchases, transfers_in, transfers_out, assignments) = tokio::try_join!(
            self.snapshots.find_snapshots(&scope),
            tx.find_transactions(TransactionCategory::Purchases, &scope, None),
            tx.find_transactions(TransactionCategory::TransfersIn, &scope, None),
            tx.find_transactions(TransactionCategory::TransfersOut, &scope, None),
            tx.find_transactions(TransactionCategory::Assignments, &scope, None),
        )?;

        let mut by_asset: HashMap<String, Vec<LedgerTransaction>> = HashMap::new();
        for tx in purchases
            .into_iter()
            .chain(transfers_in)
            .chain(transfers_out)
            .chain(assignments)
        {
            by_asset.entry(tx.asset_type.clone()).or_default().push(tx);
        }

        let snapshots = snapshots
            .into_iter()
            .map(|snapshot| {
                let log = by_asset.get(&snapshot.asset_type).map(Vec::as_slice).unwrap_or(&[]);
                let projected = ledger::project(snapshot.figures.opening_balance, log);
                SnapshotDrift {
                    in_sync: projected == snapshot.figures,
                    asset_type: snapshot.asset_type,
                    stored: snapshot.figures,
                    projected,
                }
            })
            .collect();

        let report = ReconcileReport {
            base_id: base_id.to_string(),
            snapshots,
        };

        let drifted = report.drifted().count();
        if drifted > 0 {
            warn!(drifted, "Snapshots disagree with the transaction log");
        }
        Ok(report)
    }

    /// Overwrites every drifted snapshot of the base with its projection.
    ///
    /// The reconcile pass only picks candidates. Each candidate is then locked,
    /// its log re-read and re-projected inside the write transaction, so a
    /// movement that commits in between is never dropped.
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    pub async fn rebuild(
        &self,
        session: &Session,
        base_id: &str,
    ) -> Result<RebuildReport, ServiceError> {
        let report = self.reconcile(base_id).await?;
        let candidates: Vec<String> = report.drifted().map(|d| d.asset_type.clone()).collect();

        if candidates.is_empty() {
            return Ok(RebuildReport {
                base_id: base_id.to_string(),
                rebuilt: Vec::new(),
            });
        }

        let base = base_id.to_string();
        let user_id = session.user_id.clone();
        let rebuilt = self
            .db
            .transaction::<_, Vec<String>, ServiceError>(move |txn| {
                Box::pin(async move {
                    let mut rebuilt = Vec::new();
                    for asset_type in candidates {
                        let Some(row) =
                            snapshot_repository::find_for_update(txn, &base, &asset_type).await?
                        else {
                            continue;
                        };

                        let stored = SnapshotFigures::from(&row);
                        let log = load_asset_log(txn, &base, &asset_type).await?;
                        let projected = ledger::project(stored.opening_balance, &log);
                        if projected == stored {
                            continue;
                        }

                        snapshot_repository::overwrite(txn, row, &projected).await?;
                        audit::record(
                            txn,
                            AuditAction::SnapshotRebuilt,
                            &user_id,
                            json!({
                                "baseId": base,
                                "assetType": asset_type,
                                "before": stored,
                                "after": projected,
                            }),
                        )
                        .await?;
                        rebuilt.push(asset_type);
                    }
                    Ok(rebuilt)
                })
            })
            .await?;

        info!(base_id, rebuilt = rebuilt.len(), "Rebuilt drifted snapshots");
        Ok(RebuildReport {
            base_id: base_id.to_string(),
            rebuilt,
        })
    }
}

/// Every ledger line for one asset type at one base, read on `db`.
async fn load_asset_log<C: ConnectionTrait>(
    db: &C,
    base_id: &str,
    asset_type: &str,
) -> Result<Vec<LedgerTransaction>, ServiceError> {
    let scope = LedgerScope::base(base_id).with_asset_type(Some(asset_type.to_string()));
    let mut log = Vec::new();
    for category in TransactionCategory::iter() {
        let rows = load_transactions(db, category, &scope, None)
            .await
            .map_err(|e| ServiceError::retrieval(&category.to_string(), e))?;
        log.extend(rows);
    }
    Ok(log)
}
