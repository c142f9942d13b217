//! The engine: submission entry points, dispatcher, and ack reconciler.
//!
//! [`Engine`] owns the entity store, the throttle queue, and the shadow
//! book, and is the only way to mutate them. Every entry point leaves the
//! model in a state where the shadow book is uncrossed; a failure to do so
//! is a fatal [`OmsError`], not a recoverable condition.
//!
//! Self-crosses detected on the way in are *not* errors — they are inputs
//! the guard exists to reject. Rejected inserts are discarded wholesale,
//! rejected amends discard the amend and immediately schedule the order
//! for deletion, rejected quotes leave the resting quote untouched.

use mmc_core::config::EngineConfig;
use mmc_core::types::{OperationId, OrderId, Price, Qty, Side};

use crate::book::{Ladder, ShadowBook};
use crate::cross;
use crate::oracle::RateOracle;
use crate::order::{
    Operation, OperationPayload, OperationState, OperationType, Order, OrderState, QuoteSide,
};
use crate::store::EntityStore;
use crate::throttle::ThrottleQueue;

/// Fatal model errors. Input rejections are reported through
/// [`Submission`], never through this enum.
#[derive(Debug, thiserror::Error)]
pub enum OmsError {
    /// Caller referenced an order the store does not hold.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),
    /// Caller referenced an operation the store does not hold.
    #[error("operation not found: {0}")]
    OperationNotFound(OperationId),
    /// Amend issued against an order that is deleting or gone.
    #[error("cannot amend {order_id} in state {state}")]
    InvalidAmend {
        order_id: OrderId,
        state: OrderState,
    },
    /// Delete issued against an order that is already deleting or gone.
    #[error("cannot delete {order_id} in state {state}")]
    InvalidDelete {
        order_id: OrderId,
        state: OrderState,
    },
    /// A dispatched operation claimed to supersede a shadow-book entry
    /// that is not there. The model is corrupted.
    #[error("superseded operation {0} missing from the shadow book")]
    MissingBookEntry(OperationId),
    /// The shadow book carries both bid and ask quantity at one level.
    #[error("shadow book crossed at price level {price}")]
    BookCrossed { price: Price },
}

/// Where a submission ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Dispatched to the exchange immediately.
    Sent(OperationId),
    /// Parked in the throttle queue.
    Queued(OperationId),
    /// Rejected by the cross guard; nothing was dispatched.
    RejectedCross,
    /// Fast-path delete: the order never reached the market and is gone.
    Finalised,
    /// Nothing to do (delete of a never-used quote).
    NoOp,
}

/// The order-management core. See the crate docs for the state machines it
/// drives.
pub struct Engine {
    config: EngineConfig,
    store: EntityStore,
    throttle: ThrottleQueue,
    book: ShadowBook,
    oracle: Box<dyn RateOracle>,
}

impl Engine {
    /// Create an engine holding only the quote entity.
    pub fn new(config: EngineConfig, oracle: Box<dyn RateOracle>) -> Self {
        Self {
            config,
            store: EntityStore::new(),
            throttle: ThrottleQueue::new(),
            book: ShadowBook::new(),
            oracle,
        }
    }

    /// Read access to the entity store.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Identifier of the quote entity.
    pub fn quote_id(&self) -> OrderId {
        self.store.quote_id()
    }

    /// Queued operation ids, oldest first.
    pub fn throttle_ids(&self) -> &[OperationId] {
        self.throttle.ids()
    }

    /// Shadow-book operation ids in dispatch order.
    pub fn book_ids(&self) -> &[OperationId] {
        self.book.ids()
    }

    /// Per-level aggregation of the shadow book.
    pub fn ladder(&self) -> Ladder {
        self.book.ladder(&self.store, self.config.upper_price)
    }

    // ── Submission entry points ────────────────────────────────────────

    /// Insert a new order. A cross rejection discards the order entirely.
    pub fn insert_order(
        &mut self,
        side: Side,
        price: Price,
        qty: Qty,
    ) -> Result<Submission, OmsError> {
        let order_id = self.store.alloc_order(side, price, qty);
        let op_id = self.store.alloc_operation(
            order_id,
            OperationType::InsertOrder,
            None,
            OperationPayload::Order { price, qty },
        );
        tracing::info!(order = %self.expect_order(order_id)?, "order insert");

        if !cross::check_pending_insert_or_amend(&self.store, self.expect_order(order_id)?) {
            tracing::info!(
                operation = %self.expect_operation(op_id)?,
                "order insert crossed, rejecting operation"
            );
            self.store.dispose_order(order_id);
            return Ok(Submission::RejectedCross);
        }

        self.submit(op_id)
    }

    /// Amend an order's price and quantity.
    ///
    /// The order's intended values change immediately, before the exchange
    /// confirms — the cross guard reasons over the proposed values. A cross
    /// rejection discards the amend and schedules the order for deletion
    /// rather than leaving it resting at a now-inconsistent price.
    pub fn amend_order(
        &mut self,
        order_id: OrderId,
        price: Price,
        qty: Qty,
    ) -> Result<Submission, OmsError> {
        let order = self.expect_order(order_id)?;
        if order.is_quote
            || !matches!(
                order.state,
                OrderState::PriorToMarket | OrderState::OnMarket
            )
        {
            return Err(OmsError::InvalidAmend {
                order_id,
                state: order.state,
            });
        }
        let previous = order.history.last().copied();

        {
            let order = self
                .store
                .order_mut(order_id)
                .ok_or(OmsError::OrderNotFound(order_id))?;
            order.price = price;
            order.qty = qty;
        }
        let op_id = self.store.alloc_operation(
            order_id,
            OperationType::AmendOrder,
            previous,
            OperationPayload::Order { price, qty },
        );
        tracing::info!(order = %self.expect_order(order_id)?, "order amend");

        if !cross::check_pending_insert_or_amend(&self.store, self.expect_order(order_id)?) {
            tracing::info!(
                operation = %self.expect_operation(op_id)?,
                "order amend crossed, rejecting operation and scheduling delete"
            );
            self.store.remove_operation(op_id);
            self.delete_order(order_id)?;
            return Ok(Submission::RejectedCross);
        }

        self.submit(op_id)
    }

    /// Delete an order.
    ///
    /// An order that never reached the market is disposed of on the spot;
    /// otherwise a delete instruction is routed like any other, conflating
    /// whatever was still queued for the order.
    pub fn delete_order(&mut self, order_id: OrderId) -> Result<Submission, OmsError> {
        let order = self.expect_order(order_id)?;
        if order.is_quote
            || !matches!(
                order.state,
                OrderState::PriorToMarket | OrderState::OnMarket
            )
        {
            return Err(OmsError::InvalidDelete {
                order_id,
                state: order.state,
            });
        }
        let previous = order.history.last().copied();
        let (price, qty, state) = (order.price, order.qty, order.state);

        let op_id = self.store.alloc_operation(
            order_id,
            OperationType::DeleteOrder,
            previous,
            OperationPayload::Order { price, qty },
        );
        tracing::info!(order = %self.expect_order(order_id)?, "order delete");

        if state == OrderState::PriorToMarket {
            // Fast path: nothing was ever dispatched, so there is no
            // exchange slot to clear. Purge the queue and drop the order,
            // delete record included.
            self.remove_order_from_throttle(order_id);
            self.store
                .order_mut(order_id)
                .ok_or(OmsError::OrderNotFound(order_id))?
                .state = OrderState::Finalised;
            self.store.dispose_order(order_id);
            tracing::info!(%order_id, "order finalised without reaching the market");
            return Ok(Submission::Finalised);
        }

        // The delete supersedes anything still queued for this order.
        self.conflate(op_id)?;
        // From here on the order no longer counts for crosses, dispatched
        // or not.
        self.store
            .order_mut(order_id)
            .ok_or(OmsError::OrderNotFound(order_id))?
            .state = OrderState::DeleteSentToMarket;

        self.submit(op_id)
    }

    /// Refresh the two-sided quote. A cross rejection discards the new
    /// quote operation and leaves the resting quote state intact.
    pub fn insert_quote(&mut self, bid: QuoteSide, ask: QuoteSide) -> Result<Submission, OmsError> {
        // The action generator constructs quotes with bid strictly below
        // ask; the guard only reasons about other orders.
        debug_assert!(bid.price < ask.price, "quote is internally crossed");

        let quote_id = self.store.quote_id();
        let previous = self.expect_order(quote_id)?.history.last().copied();
        let op_id = self.store.alloc_operation(
            quote_id,
            OperationType::InsertQuote,
            previous,
            OperationPayload::Quote {
                bid: Some(bid),
                ask: Some(ask),
            },
        );
        tracing::info!(operation = %self.expect_operation(op_id)?, "quote insert");

        if !cross::check_pending_quote(&self.store, self.expect_operation(op_id)?) {
            tracing::info!(
                operation = %self.expect_operation(op_id)?,
                "quote insert crossed, rejecting operation"
            );
            self.store.remove_operation(op_id);
            return Ok(Submission::RejectedCross);
        }

        self.submit(op_id)
    }

    /// Withdraw both sides of the quote.
    ///
    /// Modelled as a quote operation with both sides absent: it travels the
    /// normal throttle/dispatch path and clears the occupied shadow-book
    /// slot without adding a new one. The quote entity itself lives on.
    pub fn delete_quote(&mut self) -> Result<Submission, OmsError> {
        let quote_id = self.store.quote_id();
        let previous = match self.expect_order(quote_id)?.history.last().copied() {
            Some(prev) => prev,
            None => return Ok(Submission::NoOp),
        };

        let op_id = self.store.alloc_operation(
            quote_id,
            OperationType::DeleteQuote,
            Some(previous),
            OperationPayload::Quote {
                bid: None,
                ask: None,
            },
        );
        tracing::info!(operation = %self.expect_operation(op_id)?, "quote delete");

        self.submit(op_id)
    }

    // ── Throttle draining and acknowledgements ─────────────────────────

    /// Drain the throttle queue within a freshly drawn window, deletes
    /// first. Returns how many operations were dispatched.
    pub fn process_throttle_queue(&mut self) -> Result<u32, OmsError> {
        if self.throttle.is_empty() {
            return Ok(0);
        }
        let window = self
            .oracle
            .drain_window()
            .min(self.config.max_drain_per_tick);
        tracing::debug!(depth = self.throttle.len(), window, "draining throttle queue");

        let batch = self.throttle.take_drainable(&self.store, window as usize);
        let dispatched = batch.len() as u32;
        for op_id in batch {
            tracing::info!(operation = %self.expect_operation(op_id)?, "operation popped from throttle");
            self.send_to_market(op_id)?;
        }
        Ok(dispatched)
    }

    /// Acknowledge up to a freshly drawn quota of `SentToMarket`
    /// operations, scanning orders in creation order. Returns how many
    /// were acknowledged.
    pub fn ack_operations(&mut self) -> Result<u32, OmsError> {
        let quota = self.oracle.ack_quota().min(self.config.max_acks_per_tick);
        let mut acked = 0;

        'orders: for order_id in self.store.order_ids() {
            let order = self.expect_order(order_id)?;
            if order.state == OrderState::Finalised {
                continue;
            }
            for op_id in order.history.clone() {
                if acked == quota {
                    break 'orders;
                }
                let op = self
                    .store
                    .operation_mut(op_id)
                    .ok_or(OmsError::OperationNotFound(op_id))?;
                if op.state != OperationState::SentToMarket {
                    continue;
                }
                op.state = OperationState::Acked;
                let kind = op.kind;
                tracing::info!(operation = %self.expect_operation(op_id)?, "operation acked");

                let order = self
                    .store
                    .order_mut(order_id)
                    .ok_or(OmsError::OrderNotFound(order_id))?;
                match kind {
                    OperationType::DeleteOrder => order.state = OrderState::Finalised,
                    // The quote entity is never finalised.
                    OperationType::DeleteQuote => {}
                    _ => {
                        // Do not regress an order a later delete is
                        // already tearing down.
                        if !order.is_quote && order.state != OrderState::DeleteSentToMarket {
                            order.state = OrderState::OnMarket;
                        }
                    }
                }
                acked += 1;
            }
        }

        Ok(acked)
    }

    // ── Housekeeping ───────────────────────────────────────────────────

    /// Dispose of resolved state: finalised orders once the store grows
    /// past its threshold, and the resolved prefix of the quote history.
    pub fn collect_garbage(&mut self) {
        if self.store.order_count() > self.config.order_gc_threshold {
            let removed = self.store.collect_finalised();
            if removed > 0 {
                tracing::info!(removed, "clearing finalised orders");
            }
        }
        if self.store.truncate_quote_history(
            self.config.quote_history_limit,
            self.config.quote_history_truncate,
        ) {
            tracing::info!("clearing resolved quote history");
        }
    }

    /// Silent invariant check: the shadow book must never carry both bid
    /// and ask quantity at one price level. Runs after every dispatch; the
    /// driver may also call it at phase boundaries.
    pub fn assert_book_not_crossed(&self) -> Result<(), OmsError> {
        match self.ladder().first_crossed_level() {
            Some(price) => Err(OmsError::BookCrossed { price }),
            None => Ok(()),
        }
    }

    // ── Internals ──────────────────────────────────────────────────────

    /// Route an operation: dispatch when the rate window is open, queue
    /// otherwise. The window is closed whenever the queue is non-empty.
    fn submit(&mut self, op_id: OperationId) -> Result<Submission, OmsError> {
        let open = self.throttle.is_empty() && self.oracle.window_open();
        if open {
            self.send_to_market(op_id)?;
            Ok(Submission::Sent(op_id))
        } else {
            tracing::info!("throttle closed");
            self.push_to_throttle(op_id)?;
            Ok(Submission::Queued(op_id))
        }
    }

    /// Dispatch one operation and reconcile the shadow book.
    fn send_to_market(&mut self, op_id: OperationId) -> Result<(), OmsError> {
        let op = self
            .store
            .operation_mut(op_id)
            .ok_or(OmsError::OperationNotFound(op_id))?;
        op.state = OperationState::SentToMarket;
        let (kind, previous, order_id) = (op.kind, op.previous, op.order_id);
        tracing::info!(operation = %self.expect_operation(op_id)?, "operation sent to market");

        let order = self
            .store
            .order_mut(order_id)
            .ok_or(OmsError::OrderNotFound(order_id))?;
        if !order.is_quote {
            order.state = if kind.is_delete() {
                OrderState::DeleteSentToMarket
            } else {
                OrderState::OnMarket
            };
        }

        // The dispatched operation overwrites the exchange slot its
        // predecessor occupied.
        if let Some(prev) = previous {
            if !self.book.remove(prev) {
                tracing::error!(
                    operation = %prev,
                    "superseded operation missing from the shadow book"
                );
                return Err(OmsError::MissingBookEntry(prev));
            }
        }
        // Inserts and amends occupy a slot; a delete has already cleared
        // its predecessor and adds nothing.
        if matches!(
            kind,
            OperationType::InsertOrder | OperationType::AmendOrder | OperationType::InsertQuote
        ) {
            self.book.push(op_id);
        }

        self.assert_book_not_crossed()
    }

    /// Park an operation in the throttle queue, conflating anything older
    /// queued for the same order.
    fn push_to_throttle(&mut self, op_id: OperationId) -> Result<(), OmsError> {
        self.conflate(op_id)?;
        self.throttle.push(&mut self.store, op_id);
        tracing::info!(
            operation = %self.expect_operation(op_id)?,
            depth = self.throttle.len(),
            "operation throttled"
        );
        Ok(())
    }

    /// Remove every queued operation of `op_id`'s order from the queue and
    /// from the order history. The newcomer inherits the `previous` link of
    /// the first draft it displaces, so it overwrites the correct
    /// shadow-book slot when it eventually dispatches.
    fn conflate(&mut self, op_id: OperationId) -> Result<(), OmsError> {
        let order_id = self.expect_operation(op_id)?.order_id;
        self.remove_order_from_throttle(order_id);

        let superseded: Vec<OperationId> = self
            .expect_order(order_id)?
            .history
            .iter()
            .copied()
            .filter(|&id| id != op_id)
            .filter(|&id| {
                self.store
                    .operation(id)
                    .map(|op| op.state == OperationState::Queued)
                    .unwrap_or(false)
            })
            .collect();

        if let Some(&first) = superseded.first() {
            let inherited = self.expect_operation(first)?.previous;
            self.store
                .operation_mut(op_id)
                .ok_or(OmsError::OperationNotFound(op_id))?
                .previous = inherited;
        }
        for id in superseded {
            tracing::info!(operation = %self.expect_operation(id)?, "removing superseded operation from order");
            self.store.remove_operation(id);
        }
        Ok(())
    }

    /// Drop every queued entry of `order_id` from the throttle queue.
    fn remove_order_from_throttle(&mut self, order_id: OrderId) {
        for op_id in self.throttle.remove_order(&self.store, order_id) {
            if let Some(op) = self.store.operation(op_id) {
                tracing::info!(operation = %op, "removing operation from throttle");
            }
        }
    }

    fn expect_order(&self, id: OrderId) -> Result<&Order, OmsError> {
        self.store.order(id).ok_or(OmsError::OrderNotFound(id))
    }

    fn expect_operation(&self, id: OperationId) -> Result<&Operation, OmsError> {
        self.store
            .operation(id)
            .ok_or(OmsError::OperationNotFound(id))
    }
}
