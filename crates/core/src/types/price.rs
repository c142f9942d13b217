//! Integer tick-domain price and quantity types.
//!
//! The simulated instrument quotes on a small integer price grid
//! (`1..=upper_price`) with integer quantities, so [`Price`] and [`Qty`]
//! wrap `i64` directly. The newtypes exist to keep the two domains from
//! being mixed up in signatures, not to add arithmetic semantics.

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// A price level on the integer tick grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(pub i64);

impl Price {
    /// Returns the raw tick value.
    #[inline]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An order quantity in whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Qty(pub i64);

impl Qty {
    /// Zero quantity.
    pub const ZERO: Qty = Qty(0);

    /// Returns the raw unit count.
    #[inline]
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Returns `true` if this quantity is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Qty {
    type Output = Qty;

    #[inline]
    fn add(self, rhs: Qty) -> Qty {
        Qty(self.0 + rhs.0)
    }
}

impl AddAssign for Qty {
    #[inline]
    fn add_assign(&mut self, rhs: Qty) {
        self.0 += rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_ordering() {
        assert!(Price(4) < Price(6));
        assert!(Price(9) > Price(1));
        assert_eq!(Price(5), Price(5));
    }

    #[test]
    fn test_price_display() {
        assert_eq!(format!("{}", Price(7)), "7");
    }

    #[test]
    fn test_qty_zero() {
        assert!(Qty::ZERO.is_zero());
        assert!(!Qty(10).is_zero());
    }

    #[test]
    fn test_qty_add() {
        assert_eq!(Qty(30) + Qty(12), Qty(42));
    }

    #[test]
    fn test_qty_add_assign() {
        let mut total = Qty::ZERO;
        total += Qty(10);
        total += Qty(25);
        assert_eq!(total, Qty(35));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Price(3).value(), 3);
        assert_eq!(Qty(100).value(), 100);
    }
}
