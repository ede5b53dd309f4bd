//! X (Twitter) API adapters

mod write;

pub use write::{DEFAULT_MAX_CHARS, LINK_COST, XDestination, weighted_length};
