pub mod assignment;
pub mod audit_log;
pub mod inventory_snapshot;
pub mod purchase;
pub mod transfer;
