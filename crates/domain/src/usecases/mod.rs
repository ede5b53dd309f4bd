//! Application use cases / business logic

pub mod compose;
pub mod render;
pub mod run_loop;
pub mod tags;
pub mod tracker;

pub use compose::{ContractViolation, TextComposer, compose};
pub use render::Renderer;
pub use run_loop::{ConnectedDestination, ConnectedFeed, RunLoop, RunLoopConfig, RunLoopError};
pub use tags::{resolve_tags, select_tags};
pub use tracker::{PostAttempt, PublicationTracker, RunCounters};
