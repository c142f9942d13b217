//! Shadow book: the client's estimate of its own resting liquidity.
//!
//! Holds the operations believed to currently occupy a slot at the
//! exchange — dispatched inserts and amends that have not been superseded
//! or deleted. This is the client's best estimate, not the exchange's
//! truth; the acknowledgement stream is what keeps it honest.
//!
//! [`Ladder`] aggregates the book per price level. A level carrying both
//! bid and ask quantity means the model is corrupted: the silent check in
//! [`Ladder::first_crossed_level`] runs after every dispatch, and the
//! driver's ladder printer doubles as the human-readable view of the same
//! oracle.

use std::collections::BTreeMap;

use mmc_core::types::{OperationId, Price, Qty, Side};

use crate::order::OperationPayload;
use crate::store::EntityStore;

/// Ordered collection of operations believed live at the exchange.
#[derive(Default)]
pub struct ShadowBook {
    entries: Vec<OperationId>,
}

impl ShadowBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Book entries in dispatch order.
    pub fn ids(&self) -> &[OperationId] {
        &self.entries
    }

    /// Append a freshly dispatched insert or amend.
    pub fn push(&mut self, op_id: OperationId) {
        self.entries.push(op_id);
    }

    /// Remove the superseded entry by exact identity. Returns `false` if it
    /// was not present — an invariant breach the dispatcher escalates.
    pub fn remove(&mut self, op_id: OperationId) -> bool {
        match self.entries.iter().position(|&id| id == op_id) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Aggregate the book into per-level bid and ask quantities.
    pub fn ladder(&self, store: &EntityStore, upper_price: i64) -> Ladder {
        let mut bids: BTreeMap<Price, Qty> = BTreeMap::new();
        let mut asks: BTreeMap<Price, Qty> = BTreeMap::new();

        for op in self.entries.iter().filter_map(|&id| store.operation(id)) {
            match &op.payload {
                OperationPayload::Quote { bid, ask } => {
                    if let Some(side) = bid {
                        *bids.entry(side.price).or_insert(Qty::ZERO) += side.qty;
                    }
                    if let Some(side) = ask {
                        *asks.entry(side.price).or_insert(Qty::ZERO) += side.qty;
                    }
                }
                OperationPayload::Order { price, qty } => {
                    let Some(order) = store.order(op.order_id) else {
                        continue;
                    };
                    match order.side {
                        Side::Buy => *bids.entry(*price).or_insert(Qty::ZERO) += *qty,
                        Side::Sell => *asks.entry(*price).or_insert(Qty::ZERO) += *qty,
                    }
                }
            }
        }

        Ladder {
            bids,
            asks,
            upper_price,
        }
    }
}

/// Per-level aggregation of the shadow book.
pub struct Ladder {
    bids: BTreeMap<Price, Qty>,
    asks: BTreeMap<Price, Qty>,
    upper_price: i64,
}

impl Ladder {
    /// Aggregated bid quantity at `price`.
    pub fn bid_at(&self, price: Price) -> Qty {
        self.bids.get(&price).copied().unwrap_or(Qty::ZERO)
    }

    /// Aggregated ask quantity at `price`.
    pub fn ask_at(&self, price: Price) -> Qty {
        self.asks.get(&price).copied().unwrap_or(Qty::ZERO)
    }

    /// Levels from the top of the grid down to 1, as
    /// `(price, bid_qty, ask_qty)`.
    pub fn levels(&self) -> impl Iterator<Item = (Price, Qty, Qty)> + '_ {
        (1..=self.upper_price)
            .rev()
            .map(|p| (Price(p), self.bid_at(Price(p)), self.ask_at(Price(p))))
    }

    /// The highest price level carrying both bid and ask quantity, if any.
    /// A `Some` here means the self-cross guard has been defeated and the
    /// model can no longer be trusted.
    pub fn first_crossed_level(&self) -> Option<Price> {
        self.levels()
            .find(|(_, bid, ask)| !bid.is_zero() && !ask.is_zero())
            .map(|(price, _, _)| price)
    }
}
