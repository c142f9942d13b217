//! Throttle queue: single-slot-per-order parking for a closed rate window.
//!
//! When the exchange's rate window is closed, instructions queue here.
//! Admission conflates: a new instruction for an order displaces anything
//! already queued for it, so the queue never holds more than one entry per
//! order and only the newest intent is ever dispatched.

use mmc_core::types::{OperationId, OrderId};

use crate::order::OperationState;
use crate::store::EntityStore;

/// FIFO of queued operation ids, oldest at the front.
#[derive(Default)]
pub struct ThrottleQueue {
    entries: Vec<OperationId>,
}

impl ThrottleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued operation ids, oldest first.
    pub fn ids(&self) -> &[OperationId] {
        &self.entries
    }

    pub fn contains(&self, op_id: OperationId) -> bool {
        self.entries.contains(&op_id)
    }

    /// Append a freshly conflated operation and mark it `Queued`.
    pub fn push(&mut self, store: &mut EntityStore, op_id: OperationId) {
        debug_assert!(!self.entries.contains(&op_id));
        self.entries.push(op_id);
        if let Some(op) = store.operation_mut(op_id) {
            op.state = OperationState::Queued;
        }
    }

    /// Remove every queued entry belonging to `order_id`, returning the
    /// removed ids in queue order.
    pub fn remove_order(&mut self, store: &EntityStore, order_id: OrderId) -> Vec<OperationId> {
        let mut removed = Vec::new();
        self.entries.retain(|&op_id| {
            let belongs = store
                .operation(op_id)
                .map(|op| op.order_id == order_id)
                .unwrap_or(false);
            if belongs {
                removed.push(op_id);
            }
            !belongs
        });
        removed
    }

    /// Select up to `window` operations for dispatch and remove them from
    /// the queue, returning them in dispatch order.
    ///
    /// Two passes, both youngest-first: deletes drain ahead of everything
    /// else, because with a narrow window a cancellation unblocks future
    /// sends where an insert only adds exposure.
    pub fn take_drainable(&mut self, store: &EntityStore, window: usize) -> Vec<OperationId> {
        let mut selected = Vec::new();
        let mut window = window;

        // Pass 1: deletes.
        let mut i = self.entries.len();
        while i > 0 && window > 0 {
            i -= 1;
            let op_id = self.entries[i];
            let is_delete = store
                .operation(op_id)
                .map(|op| op.kind.is_delete())
                .unwrap_or(false);
            if is_delete {
                self.entries.remove(i);
                selected.push(op_id);
                window -= 1;
            }
        }

        // Pass 2: everything else.
        let mut i = self.entries.len();
        while i > 0 && window > 0 {
            i -= 1;
            let op_id = self.entries[i];
            self.entries.remove(i);
            selected.push(op_id);
            window -= 1;
        }

        selected
    }
}
