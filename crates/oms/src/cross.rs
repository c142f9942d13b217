//! Cross guard: would a proposed instruction cross the firm's own book?
//!
//! Both predicates return `false` to mean *would cross*. They reason over
//! worst-case exposures — acknowledged and in-flight prices alike — because
//! an instruction that is safe against the acked book can still collide
//! with an amend the exchange has not applied yet.

use mmc_core::types::{Price, Side};

use crate::exposure::live_price;
use crate::order::{OperationPayload, OperationState, Operation, Order, OrderState};
use crate::store::EntityStore;

fn max(a: Price, b: Price) -> Price {
    a.max(b)
}

fn min(a: Price, b: Price) -> Price {
    a.min(b)
}

/// Orders in these states cannot participate in a cross: a finalised order
/// is gone and a delete already en route removes the exposure.
fn exempt_from_cross(order: &Order) -> bool {
    matches!(
        order.state,
        OrderState::Finalised | OrderState::DeleteSentToMarket
    )
}

/// The quote's effective ask: the worse (lower) of the last acknowledged
/// ask and the lowest unacknowledged one, walking the quote history in
/// order. A later acknowledgement supersedes earlier ones, so an acked
/// operation with a withdrawn ask clears the acknowledged exposure.
fn effective_quote_ask(store: &EntityStore) -> Option<Price> {
    let mut last_acked: Option<Price> = None;
    let mut lowest_unacked: Option<Price> = None;
    for op in store.quote().history.iter().filter_map(|&id| store.operation(id)) {
        let OperationPayload::Quote { ask, .. } = &op.payload else {
            continue;
        };
        if op.state == OperationState::Acked {
            last_acked = ask.map(|side| side.price);
        } else if let Some(side) = ask {
            lowest_unacked = Some(match lowest_unacked {
                Some(p) => min(p, side.price),
                None => side.price,
            });
        }
    }
    match (last_acked, lowest_unacked) {
        (Some(a), Some(b)) => Some(min(a, b)),
        (a, b) => a.or(b),
    }
}

/// The quote's effective bid: the worse (higher) of the last acknowledged
/// bid and the highest unacknowledged one.
fn effective_quote_bid(store: &EntityStore) -> Option<Price> {
    let mut last_acked: Option<Price> = None;
    let mut highest_unacked: Option<Price> = None;
    for op in store.quote().history.iter().filter_map(|&id| store.operation(id)) {
        let OperationPayload::Quote { bid, .. } = &op.payload else {
            continue;
        };
        if op.state == OperationState::Acked {
            last_acked = bid.map(|side| side.price);
        } else if let Some(side) = bid {
            highest_unacked = Some(match highest_unacked {
                Some(p) => max(p, side.price),
                None => side.price,
            });
        }
    }
    match (last_acked, highest_unacked) {
        (Some(a), Some(b)) => Some(max(a, b)),
        (a, b) => a.or(b),
    }
}

/// Check a pending insert or amend against the firm's whole book.
///
/// Phase 1 compares the pending order's intended price against the resting
/// quote's effective opposite side (non-strict: touching the quote is a
/// cross). Phase 2 evaluates worst-case exposures against every opposing
/// live order. Returns `false` if the instruction would cross.
pub fn check_pending_insert_or_amend(store: &EntityStore, pending: &Order) -> bool {
    // Phase 1: against the quote.
    match pending.side {
        Side::Buy => {
            if let Some(ask) = effective_quote_ask(store) {
                if pending.price >= ask {
                    tracing::info!(
                        order = %pending.id,
                        price = %pending.price,
                        quote_ask = %ask,
                        "buy order crosses with resting quote"
                    );
                    return false;
                }
            }
        }
        Side::Sell => {
            if let Some(bid) = effective_quote_bid(store) {
                if pending.price <= bid {
                    tracing::info!(
                        order = %pending.id,
                        price = %pending.price,
                        quote_bid = %bid,
                        "sell order crosses with resting quote"
                    );
                    return false;
                }
            }
        }
    }

    // Phase 2: against every opposing live order. The quote entity is
    // skipped here — its exposure is fully covered by phase 1.
    for order in store.orders() {
        if order.is_quote || order.side == pending.side || exempt_from_cross(order) {
            continue;
        }

        match pending.side {
            Side::Buy => {
                let pending_buy = live_price(store, pending, max);
                let min_submitted_sell = live_price(store, order, min);
                if pending_buy >= min_submitted_sell {
                    tracing::info!(
                        order = %pending.id,
                        against = %order.id,
                        buy = %pending_buy,
                        sell = %min_submitted_sell,
                        "buy order crosses with resting order"
                    );
                    return false;
                }
            }
            Side::Sell => {
                let pending_sell = live_price(store, pending, min);
                let max_submitted_buy = live_price(store, order, max);
                if pending_sell <= max_submitted_buy {
                    tracing::info!(
                        order = %pending.id,
                        against = %order.id,
                        sell = %pending_sell,
                        buy = %max_submitted_buy,
                        "sell order crosses with resting order"
                    );
                    return false;
                }
            }
        }
    }

    true
}

/// Check a proposed quote operation against every non-quote live order.
///
/// Requires strict price improvement on each active side: an active ask
/// must sit strictly above every resting buy's worst-case exposure and an
/// active bid strictly below every resting sell's. The bid/ask of the
/// proposed quote itself are non-crossing by construction. Returns `false`
/// if the quote would cross.
pub fn check_pending_quote(store: &EntityStore, quote_op: &Operation) -> bool {
    let OperationPayload::Quote { bid, ask } = &quote_op.payload else {
        return true;
    };

    for order in store.orders() {
        if order.is_quote || exempt_from_cross(order) {
            continue;
        }

        match order.side {
            Side::Buy => {
                if let Some(ask) = ask {
                    let max_submitted_buy = live_price(store, order, max);
                    if ask.price <= max_submitted_buy {
                        tracing::info!(
                            against = %order.id,
                            ask = %ask.price,
                            buy = %max_submitted_buy,
                            "quote ask crosses with resting order"
                        );
                        return false;
                    }
                }
            }
            Side::Sell => {
                if let Some(bid) = bid {
                    let min_submitted_sell = live_price(store, order, min);
                    if bid.price >= min_submitted_sell {
                        tracing::info!(
                            against = %order.id,
                            bid = %bid.price,
                            sell = %min_submitted_sell,
                            "quote bid crosses with resting order"
                        );
                        return false;
                    }
                }
            }
        }
    }

    true
}
