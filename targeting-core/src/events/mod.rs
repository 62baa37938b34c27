//! Lifecycle events for evaluation and freezing.

pub mod dispatcher;
pub mod handler;
pub mod types;

pub use dispatcher::EventDispatcher;
pub use handler::TargetingEventHandler;
pub use types::*;
