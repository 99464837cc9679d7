use super::{LedgerTransaction, MovementTotals, SnapshotFigures};

/// Folds the complete history of one (base, asset type) into snapshot figures.
///
/// `opening_balance` is the seed carried by the stored snapshot; the log has
/// no record of how it was established.
pub fn project<'a, I>(opening_balance: i64, transactions: I) -> SnapshotFigures
where
    I: IntoIterator<Item = &'a LedgerTransaction>,
{
    let mut totals = MovementTotals::default();
    for tx in transactions {
        totals.record(tx.movement, tx.quantity());
    }

    SnapshotFigures {
        opening_balance,
        purchases: totals.purchases,
        transfer_in: totals.transfer_in,
        transfer_out: totals.transfer_out,
        assigned: totals.assigned,
        expended: totals.expended,
        closing_balance: opening_balance + totals.net(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AssignmentKind, Movement};
    use chrono::Utc;

    #[test]
    fn empty_log_keeps_seed() {
        let figures = project(12, std::iter::empty());
        assert_eq!(figures.closing_balance, 12);
        assert!(figures.is_balanced());
    }

    #[test]
    fn fold_matches_additive_updates() {
        let now = Utc::now();
        let log = vec![
            LedgerTransaction::new(Movement::Purchase, "Rifle", Some(50), now),
            LedgerTransaction::new(Movement::TransferOut, "Rifle", Some(20), now),
            LedgerTransaction::new(Movement::TransferIn, "Rifle", Some(4), now),
            LedgerTransaction::new(
                Movement::Assignment(AssignmentKind::Expended),
                "Rifle",
                Some(6),
                now,
            ),
        ];
        let figures = project(0, &log);
        assert_eq!(figures.purchases, 50);
        assert_eq!(figures.transfer_out, 20);
        assert_eq!(figures.transfer_in, 4);
        assert_eq!(figures.expended, 6);
        assert_eq!(figures.closing_balance, 28);
        assert!(figures.is_balanced());
    }
}
