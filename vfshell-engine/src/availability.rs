use vfshell_core::protocol::{Command, LIVENESS_TOKEN, Reply};
use vfshell_core::types::Availability;

use crate::client::DaemonClient;
use crate::context::ShellContext;

/// On-demand liveness check. Runs at startup and on explicit retry only.
#[derive(Clone)]
pub struct AvailabilityMonitor {
    client: DaemonClient,
    ctx: ShellContext,
}

impl AvailabilityMonitor {
    pub fn new(client: DaemonClient, ctx: ShellContext) -> Self {
        Self { client, ctx }
    }

    pub async fn probe(&self) -> Availability {
        let messages = self.ctx.messages();
        match self.client.call(&Command::Ping).await {
            Ok(Reply::Text(token)) if token == LIVENESS_TOKEN => {
                self.ctx.mark_reachable().await;
            }
            Ok(other) => {
                let shown = match other {
                    Reply::Text(t) => t,
                    Reply::Flag(b) => b.to_string(),
                    Reply::Unit => String::new(),
                };
                self.ctx
                    .mark_unreachable(messages.unexpected_reply(&shown))
                    .await;
            }
            Err(e) => {
                log::warn!("liveness probe failed: {e:#}");
                self.ctx.mark_unreachable(messages.start_daemon).await;
            }
        }
        self.ctx.availability().await
    }
}
