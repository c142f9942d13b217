//! Order-related types: side and entity identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy / bid.
    Buy,
    /// Sell / ask.
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

/// Internal order identifier (monotonic counter, never reused).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OID-{}", self.0)
    }
}

/// Internal operation identifier (monotonic counter, never reused).
///
/// Operations live in an arena keyed by this id; the throttle queue and
/// shadow book refer to operations exclusively through it, so disposing an
/// order can never leave a dangling reference behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OP-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_display() {
        assert_eq!(format!("{}", Side::Buy), "Buy");
        assert_eq!(format!("{}", Side::Sell), "Sell");
    }

    #[test]
    fn test_order_id_display() {
        assert_eq!(format!("{}", OrderId(42)), "OID-42");
    }

    #[test]
    fn test_operation_id_display() {
        assert_eq!(format!("{}", OperationId(7)), "OP-7");
    }

    #[test]
    fn test_ids_order_by_value() {
        assert!(OrderId(1) < OrderId(2));
        assert!(OperationId(10) > OperationId(9));
    }
}
