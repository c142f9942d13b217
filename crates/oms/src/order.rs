//! Order and operation entities with their lifecycle states.
//!
//! An [`Order`] carries the most recently *intended* price and quantity —
//! an amend updates them immediately, before the exchange confirms — plus an
//! ordered history of the operations issued against it. The single
//! process-wide quote entity is an order with [`Order::is_quote`] set; its
//! own price/quantity/state fields are inert and all quoting happens through
//! [`OperationPayload::Quote`] operations on its history.

use std::fmt;

use serde::{Deserialize, Serialize};

use mmc_core::types::{OperationId, OrderId, Price, Qty, Side};

/// Order states in the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    /// Created locally; nothing dispatched to the exchange yet.
    PriorToMarket,
    /// At least one instruction has been dispatched or acknowledged.
    OnMarket,
    /// A delete has been issued; the order no longer counts for crosses.
    DeleteSentToMarket,
    /// The delete was acknowledged; terminal state.
    Finalised,
}

impl OrderState {
    /// Returns `true` if this state is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalised)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderState::PriorToMarket => "PriorToMarket",
            OrderState::OnMarket => "OnMarket",
            OrderState::DeleteSentToMarket => "DeleteSentToMarket",
            OrderState::Finalised => "Finalised",
        };
        write!(f, "{s}")
    }
}

/// Operation states in the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationState {
    /// Just created; not yet routed.
    Initial,
    /// Parked in the throttle queue.
    Queued,
    /// Dispatched to the exchange, awaiting acknowledgement.
    SentToMarket,
    /// Acknowledged by the exchange; terminal state.
    Acked,
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationState::Initial => "Initial",
            OperationState::Queued => "Queued",
            OperationState::SentToMarket => "SentToMarket",
            OperationState::Acked => "Acked",
        };
        write!(f, "{s}")
    }
}

/// The kind of instruction an operation represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    InsertOrder,
    InsertQuote,
    AmendOrder,
    DeleteOrder,
    DeleteQuote,
}

impl OperationType {
    /// Returns `true` for the delete instructions, which drain ahead of
    /// everything else when the throttle window opens.
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::DeleteOrder | Self::DeleteQuote)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationType::InsertOrder => "InsertOrder",
            OperationType::InsertQuote => "InsertQuote",
            OperationType::AmendOrder => "AmendOrder",
            OperationType::DeleteOrder => "DeleteOrder",
            OperationType::DeleteQuote => "DeleteQuote",
        };
        write!(f, "{s}")
    }
}

/// One side of a two-sided quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSide {
    pub price: Price,
    pub qty: Qty,
}

/// Instruction body.
///
/// Order instructions carry a single price/quantity pair; quote instructions
/// carry both sides, each of which may be absent (a withdrawn side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationPayload {
    Order {
        price: Price,
        qty: Qty,
    },
    Quote {
        bid: Option<QuoteSide>,
        ask: Option<QuoteSide>,
    },
}

/// A single instruction issued against an order or the quote entity.
#[derive(Debug, Clone)]
pub struct Operation {
    /// Arena identifier.
    pub id: OperationId,
    /// Owning order.
    pub order_id: OrderId,
    /// The shadow-book entry this operation supersedes once dispatched.
    pub previous: Option<OperationId>,
    /// Instruction kind.
    pub kind: OperationType,
    /// Lifecycle state.
    pub state: OperationState,
    /// Instruction body.
    pub payload: OperationPayload,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type: {}, state: {}, ", self.kind, self.state)?;
        match &self.payload {
            OperationPayload::Order { price, qty } => write!(f, "{qty}@{price}"),
            OperationPayload::Quote { bid, ask } => {
                match bid {
                    Some(b) => write!(f, "{}@{}", b.qty, b.price)?,
                    None => write!(f, "-@-")?,
                }
                write!(f, "--")?;
                match ask {
                    Some(a) => write!(f, "{}@{}", a.qty, a.price),
                    None => write!(f, "-@-"),
                }
            }
        }
    }
}

/// Internal order representation.
#[derive(Debug, Clone)]
pub struct Order {
    /// Arena identifier.
    pub id: OrderId,
    /// Most recently intended price.
    pub price: Price,
    /// Most recently intended quantity.
    pub qty: Qty,
    /// Order side.
    pub side: Side,
    /// Lifecycle state.
    pub state: OrderState,
    /// `true` for the single process-wide quote entity.
    pub is_quote: bool,
    /// Operations issued against this order, in creation order.
    pub history: Vec<OperationId>,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: state: {}, side: {}, {}@{}",
            self.id, self.state, self.side, self.qty, self.price
        )
    }
}
