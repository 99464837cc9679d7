pub mod assignments;
pub mod dashboard;
pub mod inventory;
pub mod logs;
pub mod purchases;
pub mod transfers;

use crate::config::AppConfig;
use crate::db::{DatabaseAccess, DbPool};
use crate::repositories::{LedgerRepository, SnapshotStore, TransactionStore};
use crate::services::{
    assignments::AssignmentService, audit::AuditService, dashboard::DashboardService,
    inventory::InventoryService, purchases::PurchaseService, transfers::TransferService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub dashboard: Arc<DashboardService>,
    pub purchases: Arc<PurchaseService>,
    pub transfers: Arc<TransferService>,
    pub assignments: Arc<AssignmentService>,
    pub audit: Arc<AuditService>,
    pub inventory: Arc<InventoryService>,
}

impl AppServices {
    /// Wires every service against one connection pool. The ledger
    /// repository backs both the snapshot and the transaction reads.
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        let db = DatabaseAccess::new(db_pool.clone());
        let ledger = Arc::new(LedgerRepository::new(db_pool.clone()));
        let snapshots: Arc<dyn SnapshotStore> = ledger.clone();
        let transactions: Arc<dyn TransactionStore> = ledger;

        Self {
            dashboard: Arc::new(DashboardService::new(
                snapshots.clone(),
                transactions.clone(),
            )),
            purchases: Arc::new(PurchaseService::new(db.clone())),
            transfers: Arc::new(TransferService::new(db.clone())),
            assignments: Arc::new(AssignmentService::new(db.clone())),
            audit: Arc::new(AuditService::new(db_pool, config.audit_log_page_size)),
            inventory: Arc::new(InventoryService::new(db, snapshots, transactions)),
        }
    }
}
