pub mod config;
pub mod envelope;
pub mod error;
pub mod messages;
pub mod payload;
pub mod protocol;
pub mod text;
pub mod types;

// Keep the public surface small and intentional.
pub use config::*;
pub use envelope::*;
pub use error::*;
pub use messages::*;
pub use protocol::*;
pub use text::*;
pub use types::*;
