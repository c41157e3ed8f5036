//! Rule triggers and the context value they carry through the bus.

mod context;
mod game_event;
mod kind;

pub use context::{ContextKey, ContextValue};
pub use game_event::GameEvent;
pub use kind::EventType;
