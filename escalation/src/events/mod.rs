//! Dialog events
//!
//! Pub/sub over Tokio broadcast channels plus an optional bounded history.

pub mod bus;
pub mod history;
pub mod types;

pub use bus::{EventBus, EventFilter, FilteredReceiver, SharedEventBus};
pub use history::{EventHistory, HistoryStats};
pub use types::DialogEvent;
