use std::collections::BTreeMap;

use super::{BalanceLine, DateRange, InventorySnapshot, LedgerTransaction, MovementTotals};

/// Dashboard rows straight from the stored snapshots.
///
/// `netMovement` here is purchases + transferIn - transferOut; assignments and
/// expenditures are left out of the current-state figure.
pub fn current_view(snapshots: &[InventorySnapshot]) -> Vec<BalanceLine> {
    snapshots
        .iter()
        .map(|snapshot| {
            let f = &snapshot.figures;
            BalanceLine {
                asset_type: snapshot.asset_type.clone(),
                opening_balance: f.opening_balance,
                purchases: f.purchases,
                transfer_in: f.transfer_in,
                transfer_out: f.transfer_out,
                assigned: f.assigned,
                expended: f.expended,
                closing_balance: f.closing_balance,
                net_movement: f.purchases + f.transfer_in - f.transfer_out,
            }
        })
        .collect()
}

#[derive(Debug, Default)]
struct Accumulator {
    in_range: MovementTotals,
    future_net: i64,
}

/// Rebuilds opening and closing balances for `range` by walking backward from
/// the current snapshot.
///
/// Everything after `range.end()` is undone from the current closing balance;
/// everything at or before it is tallied into the range totals. Transactions
/// for asset types with no snapshot are ignored. One row is produced per
/// snapshot, in snapshot order.
pub fn reconstruct(
    snapshots: &[InventorySnapshot],
    transactions: &[LedgerTransaction],
    range: &DateRange,
) -> Vec<BalanceLine> {
    let mut accumulators: BTreeMap<&str, Accumulator> = snapshots
        .iter()
        .map(|s| (s.asset_type.as_str(), Accumulator::default()))
        .collect();

    for tx in transactions {
        let Some(acc) = accumulators.get_mut(tx.asset_type.as_str()) else {
            continue;
        };
        if range.is_after(tx.occurred_at) {
            acc.future_net += tx.signed_quantity();
        } else {
            acc.in_range.record(tx.movement, tx.quantity());
        }
    }

    snapshots
        .iter()
        .map(|snapshot| {
            let (totals, future_net) = accumulators
                .get(snapshot.asset_type.as_str())
                .map(|a| (a.in_range, a.future_net))
                .unwrap_or_default();

            let closing_balance = snapshot.figures.closing_balance - future_net;
            let net_movement = totals.net();
            let opening_balance = closing_balance - net_movement;

            BalanceLine {
                asset_type: snapshot.asset_type.clone(),
                opening_balance,
                purchases: totals.purchases,
                transfer_in: totals.transfer_in,
                transfer_out: totals.transfer_out,
                assigned: totals.assigned,
                expended: totals.expended,
                closing_balance,
                net_movement,
            }
        })
        .collect()
}
