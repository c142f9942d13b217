//! # mmc-core
//!
//! Shared types, configuration, and logging for the MMC market-making
//! client.
//!
//! This crate provides the foundational building blocks used across the
//! workspace: integer tick-domain price and quantity types, order and
//! operation identifiers, the layered configuration loader, and the
//! tracing setup.

pub mod config;
pub mod logging;
pub mod types;
