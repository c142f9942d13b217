//! Live-price evaluator: the firm's worst-case exposure on one order.
//!
//! While amends are in flight the exchange may hold the order at any of
//! several prices: the last acknowledged one, or any pending insert/amend
//! price that might yet be acknowledged. The only safe value for cross
//! checking is the worst of all of them on the relevant side — the highest
//! for a buy, the lowest for a sell.

use mmc_core::types::Price;

use crate::order::{OperationPayload, OperationState, OperationType, Order};
use crate::store::EntityStore;

/// Compute the single price representing the current exposure of `order`,
/// folding pending prices with `cmp` (max for a buy, min for a sell).
///
/// Acknowledged insert/amend prices supersede one another — only the latest
/// counts. Pending ones all count, since any of them could be the one the
/// exchange applies. Both accumulators start from the order's intended
/// price so an order with an empty history evaluates to it.
pub fn live_price<F>(store: &EntityStore, order: &Order, cmp: F) -> Price
where
    F: Fn(Price, Price) -> Price,
{
    let mut inflight = order.price;
    let mut last_acked = order.price;

    for op in order.history.iter().filter_map(|&id| store.operation(id)) {
        if !matches!(
            op.kind,
            OperationType::InsertOrder | OperationType::AmendOrder
        ) {
            continue;
        }
        let OperationPayload::Order { price, .. } = op.payload else {
            continue;
        };
        if op.state == OperationState::Acked {
            last_acked = price;
        } else {
            inflight = cmp(price, inflight);
        }
    }

    cmp(inflight, last_acked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OperationType;
    use mmc_core::types::{Price, Qty, Side};

    fn max(a: Price, b: Price) -> Price {
        a.max(b)
    }

    fn min(a: Price, b: Price) -> Price {
        a.min(b)
    }

    fn payload(price: i64) -> OperationPayload {
        OperationPayload::Order {
            price: Price(price),
            qty: Qty(10),
        }
    }

    #[test]
    fn test_empty_history_returns_intended_price() {
        let mut store = EntityStore::new();
        let oid = store.alloc_order(Side::Buy, Price(4), Qty(10));
        let order = store.order(oid).unwrap();
        assert_eq!(live_price(&store, order, max), Price(4));
        assert_eq!(live_price(&store, order, min), Price(4));
    }

    #[test]
    fn test_pending_prices_fold_worst_case() {
        let mut store = EntityStore::new();
        let oid = store.alloc_order(Side::Buy, Price(3), Qty(10));
        store.alloc_operation(oid, OperationType::InsertOrder, None, payload(3));
        store.alloc_operation(oid, OperationType::AmendOrder, None, payload(6));

        let order = store.order(oid).unwrap();
        // Worst buy exposure: the pending amend at 6.
        assert_eq!(live_price(&store, order, max), Price(6));
    }

    #[test]
    fn test_later_ack_supersedes_earlier_ack() {
        let mut store = EntityStore::new();
        let oid = store.alloc_order(Side::Sell, Price(7), Qty(10));
        let a = store.alloc_operation(oid, OperationType::InsertOrder, None, payload(5));
        let b = store.alloc_operation(oid, OperationType::AmendOrder, None, payload(7));
        store.operation_mut(a).unwrap().state = OperationState::Acked;
        store.operation_mut(b).unwrap().state = OperationState::Acked;

        let order = store.order(oid).unwrap();
        // The last ack (7) replaces the earlier one (5); intended price is
        // also 7, so the worst sell exposure is 7.
        assert_eq!(live_price(&store, order, min), Price(7));
    }

    #[test]
    fn test_worst_of_acked_and_pending() {
        let mut store = EntityStore::new();
        let oid = store.alloc_order(Side::Buy, Price(2), Qty(10));
        let acked = store.alloc_operation(oid, OperationType::InsertOrder, None, payload(5));
        store.alloc_operation(oid, OperationType::AmendOrder, None, payload(2));
        store.operation_mut(acked).unwrap().state = OperationState::Acked;

        let order = store.order(oid).unwrap();
        // Acked at 5, amending down to 2: until the amend acks, the firm is
        // still exposed at 5.
        assert_eq!(live_price(&store, order, max), Price(5));
    }

    #[test]
    fn test_deletes_do_not_contribute() {
        let mut store = EntityStore::new();
        let oid = store.alloc_order(Side::Buy, Price(4), Qty(10));
        let ins = store.alloc_operation(oid, OperationType::InsertOrder, None, payload(4));
        store.operation_mut(ins).unwrap().state = OperationState::Acked;
        store.alloc_operation(oid, OperationType::DeleteOrder, Some(ins), payload(9));

        let order = store.order(oid).unwrap();
        // The delete payload price (9) is bookkeeping, not exposure.
        assert_eq!(live_price(&store, order, max), Price(4));
    }
}
