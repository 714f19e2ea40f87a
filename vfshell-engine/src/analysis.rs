use std::time::Duration;

use vfshell_core::envelope::FailureClass;
use vfshell_core::payload;
use vfshell_core::protocol::Command;
use vfshell_core::types::AnalysisRequest;

use crate::client::DaemonClient;
use crate::context::ShellContext;
use crate::router::TabRouter;
use crate::traits::{Notification, Topic};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutcome {
    /// Analysis text on success.
    pub text: Option<String>,
    pub notification: Notification,
}

/// Runs the daemon's analysis over the last N seconds of audio.
///
/// Failures are reported inline and never change availability, transport
/// errors included.
#[derive(Clone)]
pub struct AnalysisRunner {
    client: DaemonClient,
    ctx: ShellContext,
    router: TabRouter,
    timeout: Duration,
}

impl AnalysisRunner {
    pub fn new(
        client: DaemonClient,
        ctx: ShellContext,
        router: TabRouter,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            ctx,
            router,
            timeout,
        }
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisOutcome {
        let messages = self.ctx.messages();
        let observer = self.ctx.observer();

        if !self.ctx.is_reachable().await {
            let notification = Notification::error(Topic::Analysis, messages.start_daemon);
            observer.notify(&notification);
            return AnalysisOutcome {
                text: None,
                notification,
            };
        }

        observer.notify(&Notification::info(Topic::Analysis, messages.analysis_running));
        log::info!(
            "analysis requested: {}s, template={}",
            request.seconds,
            request.template.as_deref().unwrap_or("-")
        );

        let env = self
            .client
            .query_within(&Command::Analyze(request), self.timeout)
            .await;

        let outcome = match payload::analysis_text(&env) {
            Some(text) => AnalysisOutcome {
                text: Some(text.to_string()),
                notification: Notification::info(Topic::Analysis, messages.analysis_done),
            },
            None => {
                let detail = env.error_message(messages);
                let text = if env.failure() == Some(FailureClass::Transport) {
                    messages.error(&detail)
                } else {
                    detail
                };
                log::warn!("analysis failed: {text}");
                AnalysisOutcome {
                    text: None,
                    notification: Notification::error(Topic::Analysis, text),
                }
            }
        };
        observer.notify(&outcome.notification);

        if outcome.text.is_some() {
            // A finished analysis adds a session.
            self.router.reload_sessions().await;
        }
        outcome
    }
}
