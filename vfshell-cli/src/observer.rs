use vfshell_core::messages::Messages;
use vfshell_core::types::{Availability, RecordingState};
use vfshell_engine::traits::{Notification, NotificationKind, ShellObserver};
use vfshell_engine::views::{ViewKind, ViewUpdate};

/// Prints shell events to stdout, one block per event.
pub struct TerminalObserver {
    messages: &'static Messages,
}

impl TerminalObserver {
    pub fn new(messages: &'static Messages) -> Self {
        Self { messages }
    }
}

impl ShellObserver for TerminalObserver {
    fn availability_changed(&self, availability: Availability, message: &str) {
        let marker = match availability {
            Availability::Reachable => "+",
            Availability::Unreachable => "!",
        };
        println!("[{marker}] {message}");
    }

    fn recording_changed(&self, state: RecordingState) {
        // The label names what `toggle` will do next.
        match state {
            RecordingState::Recording => println!(
                "[rec] {} (toggle: {})",
                self.messages.recording_active, self.messages.stop_recording
            ),
            RecordingState::Idle => println!("[rec] toggle: {}", self.messages.start_recording),
        }
    }

    fn streaming_text(&self, text: Option<&str>) {
        if let Some(text) = text {
            println!("[live] {text}");
        }
    }

    fn recording_error(&self, message: &str) {
        println!("[rec] {message}");
    }

    fn view_rendered(&self, update: &ViewUpdate) {
        println!("== {} ==", heading(&update.view));
        println!("{}", update.content.render(self.messages));
    }

    fn notify(&self, notification: &Notification) {
        let marker = match notification.kind {
            NotificationKind::Info => "*",
            NotificationKind::Error => "!",
        };
        println!("[{marker}] {}", notification.text);
    }
}

fn heading(view: &ViewKind) -> String {
    match view {
        ViewKind::Sessions => "sessions".into(),
        ViewKind::SessionDetail(id) => format!("session {id}"),
        ViewKind::Analytics(period) => format!("costs ({period})"),
        ViewKind::Settings => "settings".into(),
    }
}
