//! feed-relay adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `feed`: Atom/RSS feed source (file or HTTP)
//! - `ledger`: SQLite and in-memory delivery ledgers
//! - `mastodon`, `x`: social network destinations
//! - `outbox`, `stub`: destinations that never leave the machine
//! - `shortener`: plain-text URL shorteners

mod ledger_memory;
mod ledger_sqlite;
pub mod outbox;
pub mod shortener;
pub mod stub;

pub mod feed;
pub mod mastodon;
pub mod x_api;

/// Re-exports for ledger adapters
pub mod ledger {
    pub use crate::ledger_memory::InMemoryLedger;
    pub use crate::ledger_sqlite::SqliteLedger;
}

/// Re-exports for X API adapters
pub mod x {
    pub use crate::x_api::{DEFAULT_MAX_CHARS, LINK_COST, XDestination, weighted_length};
}
