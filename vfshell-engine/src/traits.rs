use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::Serialize;
use vfshell_core::protocol::{Command, DaemonSignal, Reply};
use vfshell_core::types::{Availability, ExportFormat, RecordingState, SessionId};

use crate::views::ViewUpdate;

/// Host-provided invocation bridge to the daemon.
#[async_trait]
pub trait DaemonBridge: Send + Sync {
    async fn call(&self, command: &Command) -> anyhow::Result<Reply>;
}

/// Produces an exported session document. Answers with envelope text like
/// any daemon query.
#[async_trait]
pub trait SessionExporter: Send + Sync {
    async fn export(&self, id: SessionId, format: ExportFormat) -> anyhow::Result<String>;
}

/// Optional source of daemon-initiated signals.
#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn subscribe(&self) -> anyhow::Result<BoxStream<'static, DaemonSignal>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Analysis,
    Export,
    Daemon,
}

/// Transient, user-facing message that does not change shell state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub topic: Topic,
    pub kind: NotificationKind,
    pub text: String,
}

impl Notification {
    pub fn info(topic: Topic, text: impl Into<String>) -> Self {
        Self {
            topic,
            kind: NotificationKind::Info,
            text: text.into(),
        }
    }

    pub fn error(topic: Topic, text: impl Into<String>) -> Self {
        Self {
            topic,
            kind: NotificationKind::Error,
            text: text.into(),
        }
    }
}

/// Presentation side effects. Every hook may be called repeatedly with the
/// same value and must be fast; the engine calls them outside its locks.
pub trait ShellObserver: Send + Sync {
    fn availability_changed(&self, _availability: Availability, _message: &str) {}

    fn recording_changed(&self, _state: RecordingState) {}

    /// `None` hides the live transcript.
    fn streaming_text(&self, _text: Option<&str>) {}

    fn recording_error(&self, _message: &str) {}

    fn view_rendered(&self, _update: &ViewUpdate) {}

    fn notify(&self, _notification: &Notification) {}
}

/// Observer that drops everything.
pub struct NullObserver;

impl ShellObserver for NullObserver {}
