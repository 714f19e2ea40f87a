use serde::Serialize;
use serde_json::Value;
use vfshell_core::envelope::{Envelope, FailureClass};
use vfshell_core::messages::Messages;
use vfshell_core::payload;
use vfshell_core::protocol::Command;
use vfshell_core::text::{render_document, render_sessions_table};
use vfshell_core::types::{AnalyticsPeriod, ExportFormat, SessionId, SessionSummary};

use crate::client::DaemonClient;
use crate::context::ShellContext;
use crate::traits::{Notification, Topic};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "view", content = "arg", rename_all = "snake_case")]
pub enum ViewKind {
    Sessions,
    SessionDetail(SessionId),
    Analytics(AnalyticsPeriod),
    Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ViewContent {
    Placeholder(String),
    Error(String),
    Sessions(Vec<SessionSummary>),
    Document(Value),
}

impl ViewContent {
    pub fn render(&self, messages: &Messages) -> String {
        match self {
            ViewContent::Placeholder(text) => text.clone(),
            ViewContent::Error(text) => messages.error(text),
            ViewContent::Sessions(sessions) => render_sessions_table(sessions, messages),
            ViewContent::Document(value) => render_document(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewUpdate {
    pub view: ViewKind,
    pub content: ViewContent,
}

/// Result of one loader run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub update: ViewUpdate,
    /// The bridge itself failed; availability should be re-probed.
    pub transport_failed: bool,
}

/// Fetch-and-render pairs for each tab. Inert until called; every loader
/// renders a fixed placeholder without calling the daemon when it is
/// unreachable.
#[derive(Clone)]
pub struct ViewLoaders {
    client: DaemonClient,
    ctx: ShellContext,
    session_limit: u32,
}

impl ViewLoaders {
    pub fn new(client: DaemonClient, ctx: ShellContext, session_limit: u32) -> Self {
        Self {
            client,
            ctx,
            session_limit,
        }
    }

    pub async fn load_sessions(&self) -> LoadOutcome {
        self.load(ViewKind::Sessions, Command::GetSessions { limit: self.session_limit }, false, |env, m| {
            match payload::sessions(env, m) {
                Ok(list) if list.is_empty() => ViewContent::Placeholder(m.no_sessions.to_string()),
                Ok(list) => ViewContent::Sessions(list),
                Err(e) => ViewContent::Error(e),
            }
        })
        .await
    }

    pub async fn load_session_detail(&self, id: SessionId) -> LoadOutcome {
        self.load(ViewKind::SessionDetail(id), Command::GetSessionDetail(id), true, |env, m| {
            document(payload::session_detail(env, m))
        })
        .await
    }

    pub async fn load_analytics(&self, period: AnalyticsPeriod) -> LoadOutcome {
        self.load(
            ViewKind::Analytics(period.clone()),
            Command::GetAnalytics(period),
            true,
            |env, m| document(payload::analytics(env, m)),
        )
        .await
    }

    pub async fn load_settings(&self) -> LoadOutcome {
        self.load(ViewKind::Settings, Command::GetSettings, false, |env, m| {
            document(payload::settings(env, m))
        })
        .await
    }

    /// Fire-and-forget export. Reports through a notification and never
    /// touches availability or recording state.
    pub async fn export_session(&self, id: SessionId, format: ExportFormat) -> Notification {
        let messages = self.ctx.messages();
        let env = self
            .client
            .query(&Command::ExportSession { id, format })
            .await;

        let notification = match payload::export_path(&env, messages) {
            Ok(path) => Notification::info(
                Topic::Export,
                format!(
                    "{}{}",
                    messages.export_done,
                    path.as_deref().unwrap_or(messages.export_completed)
                ),
            ),
            Err(e) => {
                log::warn!("export of session {id} as {format} failed: {e}");
                Notification::error(Topic::Export, format!("{}{}", messages.export_failed, e))
            }
        };
        self.ctx.observer().notify(&notification);
        notification
    }

    async fn load<F>(
        &self,
        view: ViewKind,
        command: Command,
        show_loading: bool,
        render: F,
    ) -> LoadOutcome
    where
        F: FnOnce(&Envelope, &Messages) -> ViewContent,
    {
        let messages = self.ctx.messages();

        if !self.ctx.is_reachable().await {
            return self.emit(
                view,
                ViewContent::Placeholder(messages.daemon_placeholder.to_string()),
                false,
            );
        }

        if show_loading {
            self.ctx.observer().view_rendered(&ViewUpdate {
                view: view.clone(),
                content: ViewContent::Placeholder(messages.loading.to_string()),
            });
        }

        let env = self.client.query(&command).await;
        let transport_failed = env.failure() == Some(FailureClass::Transport);
        if transport_failed {
            log::warn!(
                "{} failed: {}",
                command.method(),
                env.error_message(messages)
            );
        }
        let content = render(&env, messages);
        self.emit(view, content, transport_failed)
    }

    fn emit(&self, view: ViewKind, content: ViewContent, transport_failed: bool) -> LoadOutcome {
        let update = ViewUpdate { view, content };
        self.ctx.observer().view_rendered(&update);
        LoadOutcome {
            update,
            transport_failed,
        }
    }
}

fn document(res: Result<Value, String>) -> ViewContent {
    match res {
        Ok(value) => ViewContent::Document(value),
        Err(e) => ViewContent::Error(e),
    }
}
