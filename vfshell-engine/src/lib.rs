pub mod analysis;
pub mod availability;
pub mod client;
pub mod context;
pub mod error;
pub mod poller;
pub mod recording;
pub mod router;
pub mod signals;
pub mod traits;
pub mod views;

pub use analysis::AnalysisRunner;
pub use availability::AvailabilityMonitor;
pub use client::DaemonClient;
pub use context::{Controls, ShellContext, ShellSnapshot};
pub use error::ControllerError;
pub use poller::{PollerHandle, StreamingPoller};
pub use recording::RecordingController;
pub use router::{Tab, TabRouter};
pub use signals::{SignalHandler, SignalTask, spawn_listener};
pub use traits::*;
pub use views::{LoadOutcome, ViewContent, ViewKind, ViewLoaders, ViewUpdate};
