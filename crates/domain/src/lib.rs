//! feed-relay domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Entries, ledger records and run reports
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Tag resolution, text composition, tracking and the run loop
//! - `policy`: Per-feed and per-destination options and post budgets

pub mod model;
pub mod policy;
pub mod ports;
pub mod usecases;

pub use model::*;
pub use ports::*;
