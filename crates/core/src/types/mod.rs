//! Core types for the MMC market-making client.
//!
//! The instrument trades on an integer tick grid, so prices and quantities
//! are plain integer newtypes rather than fixed-point decimals. Identifiers
//! are monotonic counters and are never reused.

pub mod order;
pub mod price;

// Re-export primary types for convenient access via `mmc_core::types::*`.
pub use order::{OperationId, OrderId, Side};
pub use price::{Price, Qty};
