use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod ledger_repository;
pub mod snapshot_repository;

pub use ledger_repository::{
    load_transactions, LedgerRepository, LedgerScope, SnapshotStore, TransactionStore,
};

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}
