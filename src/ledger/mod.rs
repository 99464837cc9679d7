//! Pure ledger domain: movement types, snapshot figures and the balance
//! arithmetic used by the dashboard and by snapshot reconciliation.
//!
//! Nothing in here touches the database; the repositories convert rows into
//! these types and the services decide what to fetch.

pub mod projection;
pub mod range;
pub mod reconstruct;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::inventory_snapshot;

pub use projection::project;
pub use range::DateRange;
pub use reconstruct::{current_view, reconstruct};

/// Largest quantity a single ledger write may carry. Keeps the cumulative
/// snapshot counters far from `i64` overflow.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Sub-type carried by assignment records.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AssignmentKind {
    #[default]
    Assigned,
    Expended,
}

impl AssignmentKind {
    /// Reads a stored discriminator. Only `expended` is special; everything
    /// else counts as a plain assignment.
    pub fn from_discriminator(raw: &str) -> Self {
        if raw == "expended" {
            Self::Expended
        } else {
            Self::Assigned
        }
    }
}

/// Direction of a ledger line relative to the base being reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movement {
    Purchase,
    TransferIn,
    TransferOut,
    Assignment(AssignmentKind),
}

impl Movement {
    /// +1 for stock entering the base, -1 for stock leaving it.
    pub fn sign(self) -> i64 {
        match self {
            Movement::Purchase | Movement::TransferIn => 1,
            Movement::TransferOut | Movement::Assignment(_) => -1,
        }
    }
}

/// The four independent fetches behind a reconstructed dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum TransactionCategory {
    Purchases,
    TransfersIn,
    TransfersOut,
    Assignments,
}

/// One quantity-bearing ledger record, already oriented to a single base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransaction {
    pub movement: Movement,
    pub asset_type: String,
    /// Missing quantities are tolerated and count as zero.
    pub quantity: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

impl LedgerTransaction {
    pub fn new(
        movement: Movement,
        asset_type: impl Into<String>,
        quantity: Option<i64>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            movement,
            asset_type: asset_type.into(),
            quantity,
            occurred_at,
        }
    }

    pub fn quantity(&self) -> i64 {
        self.quantity.unwrap_or(0)
    }

    pub fn signed_quantity(&self) -> i64 {
        self.movement.sign() * self.quantity()
    }
}

/// Per-category sums over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementTotals {
    pub purchases: i64,
    pub transfer_in: i64,
    pub transfer_out: i64,
    pub assigned: i64,
    pub expended: i64,
}

impl MovementTotals {
    pub fn record(&mut self, movement: Movement, quantity: i64) {
        match movement {
            Movement::Purchase => self.purchases += quantity,
            Movement::TransferIn => self.transfer_in += quantity,
            Movement::TransferOut => self.transfer_out += quantity,
            Movement::Assignment(AssignmentKind::Assigned) => self.assigned += quantity,
            Movement::Assignment(AssignmentKind::Expended) => self.expended += quantity,
        }
    }

    /// purchases + transferIn - transferOut - assigned - expended
    pub fn net(&self) -> i64 {
        self.purchases + self.transfer_in - self.transfer_out - self.assigned - self.expended
    }
}

/// The cumulative counters stored for one (base, asset type).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFigures {
    pub opening_balance: i64,
    pub purchases: i64,
    pub transfer_in: i64,
    pub transfer_out: i64,
    pub assigned: i64,
    pub expended: i64,
    pub closing_balance: i64,
}

impl SnapshotFigures {
    pub fn movements(&self) -> MovementTotals {
        MovementTotals {
            purchases: self.purchases,
            transfer_in: self.transfer_in,
            transfer_out: self.transfer_out,
            assigned: self.assigned,
            expended: self.expended,
        }
    }

    /// Whether `closing = opening + net` holds for the stored counters.
    pub fn is_balanced(&self) -> bool {
        self.opening_balance + self.movements().net() == self.closing_balance
    }
}

impl From<&inventory_snapshot::Model> for SnapshotFigures {
    fn from(model: &inventory_snapshot::Model) -> Self {
        Self {
            opening_balance: model.opening_balance,
            purchases: model.purchases,
            transfer_in: model.transfer_in,
            transfer_out: model.transfer_out,
            assigned: model.assigned,
            expended: model.expended,
            closing_balance: model.closing_balance,
        }
    }
}

/// Current stored state for one asset type at one base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub base_id: String,
    pub asset_type: String,
    pub figures: SnapshotFigures,
}

impl From<inventory_snapshot::Model> for InventorySnapshot {
    fn from(model: inventory_snapshot::Model) -> Self {
        let figures = SnapshotFigures::from(&model);
        Self {
            base_id: model.base_id,
            asset_type: model.asset_type,
            figures,
        }
    }
}

/// One dashboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceLine {
    #[schema(example = "Rifle")]
    pub asset_type: String,
    pub opening_balance: i64,
    pub purchases: i64,
    pub transfer_in: i64,
    pub transfer_out: i64,
    pub assigned: i64,
    pub expended: i64,
    pub closing_balance: i64,
    pub net_movement: i64,
}
