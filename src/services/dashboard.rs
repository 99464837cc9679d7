use metrics::{counter, histogram};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::ledger::{self, BalanceLine, DateRange, TransactionCategory};
use crate::repositories::{LedgerScope, SnapshotStore, TransactionStore};

/// What the caller asked the dashboard for, already validated.
#[derive(Debug, Clone, Default)]
pub struct DashboardQuery {
    pub asset_type: Option<String>,
    pub range: Option<DateRange>,
}

/// Computes per-asset-type balance lines for one base.
#[derive(Clone)]
pub struct DashboardService {
    snapshots: Arc<dyn SnapshotStore>,
    transactions: Arc<dyn TransactionStore>,
}

impl DashboardService {
    pub fn new(snapshots: Arc<dyn SnapshotStore>, transactions: Arc<dyn TransactionStore>) -> Self {
        Self {
            snapshots,
            transactions,
        }
    }

    /// Without a complete date range the stored snapshots are returned as
    /// they are. With one, balances are reconstructed from the snapshots and
    /// every transaction dated on or after the range start. Any failed fetch
    /// fails the whole request.
    #[instrument(skip(self), fields(base_id = %base_id))]
    pub async fn dashboard(
        &self,
        base_id: &str,
        query: DashboardQuery,
    ) -> Result<Vec<BalanceLine>, ServiceError> {
        let started = std::time::Instant::now();
        let scope = LedgerScope::base(base_id).with_asset_type(query.asset_type);

        let Some(range) = query.range else {
            let snapshots = self.snapshots.find_snapshots(&scope).await?;
            counter!("garrison_dashboard.requests", 1, "mode" => "snapshot");
            return Ok(ledger::current_view(&snapshots));
        };

        let since = Some(range.start());
        let tx = &self.transactions;
        let (snapshots, purchases, transfers_in, transfers_out, assignments) = tokio::try_join!(
            self.snapshots.find_snapshots(&scope),
            tx.find_transactions(TransactionCategory::Purchases, &scope, since),
            tx.find_transactions(TransactionCategory::TransfersIn, &scope, since),
            tx.find_transactions(TransactionCategory::TransfersOut, &scope, since),
            tx.find_transactions(TransactionCategory::Assignments, &scope, since),
        )?;

        let transactions: Vec<_> = purchases
            .into_iter()
            .chain(transfers_in)
            .chain(transfers_out)
            .chain(assignments)
            .collect();

        let lines = ledger::reconstruct(&snapshots, &transactions, &range);

        counter!("garrison_dashboard.requests", 1, "mode" => "reconstructed");
        histogram!("garrison_dashboard.reconstruct.duration", started.elapsed());
        info!(
            asset_types = lines.len(),
            transactions = transactions.len(),
            "Reconstructed dashboard"
        );

        Ok(lines)
    }
}
