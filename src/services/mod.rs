// Dashboard reconstruction
pub mod dashboard;

// Ledger writes
pub mod assignments;
pub mod purchases;
pub mod transfers;

// Audit trail and snapshot maintenance
pub mod audit;
pub mod inventory;
