//! The Streaming Driver (SPEC_FULL §4.7): runs a turn and yields a typed
//! event stream, applying the sentinel content filter to every delta.

pub mod driver;
pub mod events;
pub mod filter;

pub use driver::{drive_turn, CancelFlag, TurnHandle};
pub use events::StreamEvent;
