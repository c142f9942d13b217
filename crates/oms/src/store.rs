//! Entity store: arena ownership of orders and operations.
//!
//! Orders and operations live in `BTreeMap` arenas keyed by their monotonic
//! identifiers, so iteration order is creation order — the order in which
//! the acknowledgement scan walks the book of work. The throttle queue and
//! shadow book hold only [`OperationId`]s, never references, which makes
//! disposal of finalised orders mechanically safe: an id that has been
//! removed from the arena simply stops resolving.

use std::collections::BTreeMap;

use mmc_core::types::{OperationId, OrderId, Price, Qty, Side};

use crate::order::{
    Operation, OperationPayload, OperationState, OperationType, Order, OrderState,
};

/// Arena of all live orders and operations, including the quote entity.
pub struct EntityStore {
    orders: BTreeMap<OrderId, Order>,
    operations: BTreeMap<OperationId, Operation>,
    next_order_id: u64,
    next_operation_id: u64,
    quote_id: OrderId,
}

impl EntityStore {
    /// Create a store holding only the freshly created quote entity.
    ///
    /// The quote entity exists for the life of the process. Its own
    /// price/quantity/side/state fields are inert; every quote instruction
    /// is an operation on its history.
    pub fn new() -> Self {
        let quote_id = OrderId(0);
        let mut orders = BTreeMap::new();
        orders.insert(
            quote_id,
            Order {
                id: quote_id,
                price: Price(0),
                qty: Qty::ZERO,
                side: Side::Buy,
                state: OrderState::PriorToMarket,
                is_quote: true,
                history: Vec::new(),
            },
        );
        Self {
            orders,
            operations: BTreeMap::new(),
            next_order_id: 1,
            next_operation_id: 0,
            quote_id,
        }
    }

    /// Identifier of the singleton quote entity.
    pub fn quote_id(&self) -> OrderId {
        self.quote_id
    }

    /// The singleton quote entity.
    pub fn quote(&self) -> &Order {
        &self.orders[&self.quote_id]
    }

    /// Allocate a new order in `PriorToMarket` state.
    pub fn alloc_order(&mut self, side: Side, price: Price, qty: Qty) -> OrderId {
        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        self.orders.insert(
            id,
            Order {
                id,
                price,
                qty,
                side,
                state: OrderState::PriorToMarket,
                is_quote: false,
                history: Vec::new(),
            },
        );
        id
    }

    /// Allocate an operation in `Initial` state and append it to the owning
    /// order's history.
    ///
    /// # Panics
    ///
    /// Panics if `order_id` does not resolve; operations are only ever
    /// allocated for orders the caller just looked up.
    pub fn alloc_operation(
        &mut self,
        order_id: OrderId,
        kind: OperationType,
        previous: Option<OperationId>,
        payload: OperationPayload,
    ) -> OperationId {
        let id = OperationId(self.next_operation_id);
        self.next_operation_id += 1;
        self.operations.insert(
            id,
            Operation {
                id,
                order_id,
                previous,
                kind,
                state: OperationState::Initial,
                payload,
            },
        );
        self.orders
            .get_mut(&order_id)
            .expect("allocating operation for unknown order")
            .history
            .push(id);
        id
    }

    /// Look up an order.
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Look up an order mutably.
    pub fn order_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.orders.get_mut(&id)
    }

    /// Look up an operation.
    pub fn operation(&self, id: OperationId) -> Option<&Operation> {
        self.operations.get(&id)
    }

    /// Look up an operation mutably.
    pub fn operation_mut(&mut self, id: OperationId) -> Option<&mut Operation> {
        self.operations.get_mut(&id)
    }

    /// Iterate orders in creation order (the quote entity comes first).
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Snapshot of order ids in creation order.
    pub fn order_ids(&self) -> Vec<OrderId> {
        self.orders.keys().copied().collect()
    }

    /// Number of orders currently held, quote entity included.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Number of operations currently held.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Remove a single operation from the arena and from its owning order's
    /// history. Used when a superseded draft or a rejected instruction is
    /// discarded.
    pub fn remove_operation(&mut self, id: OperationId) -> Option<Operation> {
        let op = self.operations.remove(&id)?;
        if let Some(order) = self.orders.get_mut(&op.order_id) {
            order.history.retain(|&h| h != id);
        }
        Some(op)
    }

    /// Dispose of an order and every operation it owns.
    ///
    /// The caller must have purged the throttle queue and shadow book of
    /// this order's operations first; the store cannot see those
    /// collections.
    pub fn dispose_order(&mut self, id: OrderId) {
        debug_assert_ne!(id, self.quote_id, "the quote entity is never disposed");
        if let Some(order) = self.orders.remove(&id) {
            for op_id in order.history {
                self.operations.remove(&op_id);
            }
        }
    }

    /// Dispose of every finalised order. Returns how many were removed.
    pub fn collect_finalised(&mut self) -> usize {
        let finalised: Vec<OrderId> = self
            .orders
            .values()
            .filter(|o| o.state == OrderState::Finalised)
            .map(|o| o.id)
            .collect();
        for id in &finalised {
            self.dispose_order(*id);
        }
        finalised.len()
    }

    /// Truncate the oldest `truncate` entries of the quote history once it
    /// grows past `limit` entries, provided the first surviving entry is
    /// already acknowledged (everything before it is then historically
    /// resolved and no longer needed for cross checks).
    ///
    /// Returns `true` if a truncation happened.
    pub fn truncate_quote_history(&mut self, limit: usize, truncate: usize) -> bool {
        let quote = &self.orders[&self.quote_id];
        if quote.history.len() <= limit {
            return false;
        }
        let sentinel = quote.history[truncate];
        let resolved = self
            .operations
            .get(&sentinel)
            .map(|op| op.state == OperationState::Acked)
            .unwrap_or(false);
        if !resolved {
            return false;
        }
        let removed: Vec<OperationId> = self
            .orders
            .get_mut(&self.quote_id)
            .expect("quote entity missing")
            .history
            .drain(..truncate)
            .collect();
        for op_id in removed {
            self.operations.remove(&op_id);
        }
        true
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
