use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use vfshell_core::messages::Messages;
use vfshell_core::types::{Availability, RecordingState};

use crate::poller::PollerHandle;
use crate::traits::ShellObserver;

/// What the presentation layer should offer right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub daemon_controls_enabled: bool,
    pub retry_visible: bool,
    pub streaming_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellSnapshot {
    pub availability: Availability,
    pub status_message: String,
    pub recording: RecordingState,
    pub poller_active: bool,
    pub streaming_text: Option<String>,
}

impl ShellSnapshot {
    pub fn controls(&self) -> Controls {
        let reachable = self.availability.is_reachable();
        Controls {
            daemon_controls_enabled: reachable,
            retry_visible: !reachable,
            streaming_visible: reachable && self.recording.is_recording(),
        }
    }
}

struct Inner {
    availability: Availability,
    status_message: String,
    recording: RecordingState,
    poller: Option<PollerHandle>,
    // Bumped whenever a poller is installed or removed; poll results carrying
    // an older generation are stale.
    poll_generation: u64,
    streaming_text: Option<String>,
}

/// Shared shell state. Mutators enforce the availability, recording and
/// poller rules; observers are notified after the lock is released.
#[derive(Clone)]
pub struct ShellContext {
    inner: Arc<Mutex<Inner>>,
    observer: Arc<dyn ShellObserver>,
    messages: &'static Messages,
}

impl ShellContext {
    pub fn new(observer: Arc<dyn ShellObserver>, messages: &'static Messages) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                availability: Availability::Unreachable,
                status_message: messages.daemon_unreachable.to_string(),
                recording: RecordingState::Idle,
                poller: None,
                poll_generation: 0,
                streaming_text: None,
            })),
            observer,
            messages,
        }
    }

    pub fn messages(&self) -> &'static Messages {
        self.messages
    }

    pub fn observer(&self) -> &Arc<dyn ShellObserver> {
        &self.observer
    }

    pub async fn snapshot(&self) -> ShellSnapshot {
        let inner = self.inner.lock().await;
        ShellSnapshot {
            availability: inner.availability,
            status_message: inner.status_message.clone(),
            recording: inner.recording,
            poller_active: inner.poller.is_some(),
            streaming_text: inner.streaming_text.clone(),
        }
    }

    pub async fn availability(&self) -> Availability {
        self.inner.lock().await.availability
    }

    pub async fn is_reachable(&self) -> bool {
        self.availability().await.is_reachable()
    }

    pub async fn recording(&self) -> RecordingState {
        self.inner.lock().await.recording
    }

    pub async fn mark_reachable(&self) {
        let prev = {
            let mut inner = self.inner.lock().await;
            let prev = inner.availability;
            inner.availability = Availability::Reachable;
            inner.status_message = self.messages.daemon_reachable.to_string();
            prev
        };
        if prev != Availability::Reachable {
            log::info!("daemon availability: {prev:?} -> Reachable");
        }
        self.observer
            .availability_changed(Availability::Reachable, self.messages.daemon_reachable);
    }

    /// Also cancels any active poller: nothing polls a dead daemon.
    pub async fn mark_unreachable(&self, message: impl Into<String>) {
        let message = message.into();
        let (prev, poller, had_text) = {
            let mut inner = self.inner.lock().await;
            let prev = inner.availability;
            inner.availability = Availability::Unreachable;
            inner.status_message = message.clone();
            let poller = inner.poller.take();
            if poller.is_some() {
                inner.poll_generation += 1;
            }
            let had_text = inner.streaming_text.take().is_some();
            (prev, poller, had_text)
        };
        if let Some(poller) = poller {
            poller.cancel();
            log::info!("streaming poller cancelled: daemon unreachable");
        }
        if prev != Availability::Unreachable {
            log::warn!("daemon availability: {prev:?} -> Unreachable ({message})");
        }
        self.observer
            .availability_changed(Availability::Unreachable, &message);
        if had_text {
            self.observer.streaming_text(None);
        }
    }

    pub async fn set_recording(&self, state: RecordingState) {
        let prev = {
            let mut inner = self.inner.lock().await;
            std::mem::replace(&mut inner.recording, state)
        };
        if prev != state {
            log::info!("recording state: {prev:?} -> {state:?}");
        }
        self.observer.recording_changed(state);
    }

    pub async fn poller_active(&self) -> bool {
        self.inner.lock().await.poller.is_some()
    }

    /// Installs a poller built by `spawn` unless one already runs or polling
    /// is not allowed. Returns whether a new poller was installed.
    pub(crate) async fn install_poller<F>(&self, spawn: F) -> bool
    where
        F: FnOnce(u64) -> PollerHandle,
    {
        let mut inner = self.inner.lock().await;
        if inner.poller.is_some()
            || !inner.availability.is_reachable()
            || !inner.recording.is_recording()
        {
            return false;
        }
        inner.poll_generation += 1;
        let generation = inner.poll_generation;
        inner.poller = Some(spawn(generation));
        true
    }

    /// Removes the poller and the live text. Returns whether one was running.
    pub(crate) async fn remove_poller(&self) -> bool {
        let (poller, had_text) = {
            let mut inner = self.inner.lock().await;
            let poller = inner.poller.take();
            if poller.is_some() {
                inner.poll_generation += 1;
            }
            (poller, inner.streaming_text.take().is_some())
        };
        let was_running = poller.is_some();
        if let Some(poller) = poller {
            poller.cancel();
        }
        if was_running || had_text {
            self.observer.streaming_text(None);
        }
        was_running
    }

    pub(crate) async fn poll_allowed(&self, generation: u64) -> bool {
        let inner = self.inner.lock().await;
        inner.poll_generation == generation
            && inner.poller.is_some()
            && inner.availability.is_reachable()
    }

    /// Publishes a rendered snapshot unless it belongs to a cancelled poller.
    pub(crate) async fn publish_streaming(&self, generation: u64, text: String) -> bool {
        {
            let mut inner = self.inner.lock().await;
            if inner.poll_generation != generation || inner.poller.is_none() {
                return false;
            }
            if inner.streaming_text.as_deref() == Some(text.as_str()) {
                return true;
            }
            inner.streaming_text = Some(text.clone());
        }
        self.observer.streaming_text(Some(&text));
        true
    }
}
