pub mod bridge;
pub mod request;
pub mod runtime;
pub mod signals;

pub use bridge::{DbusBridge, SessionBus};
pub use signals::DbusSignals;
