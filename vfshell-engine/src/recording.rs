use vfshell_core::protocol::{Command, Reply};
use vfshell_core::types::RecordingState;

use crate::client::DaemonClient;
use crate::context::ShellContext;
use crate::error::ControllerError;
use crate::poller::StreamingPoller;

/// Drives recording on/off. Local state only ever changes to what the
/// daemon itself reports; start/stop replies are never trusted on their own.
#[derive(Clone)]
pub struct RecordingController {
    client: DaemonClient,
    ctx: ShellContext,
    poller: StreamingPoller,
}

impl RecordingController {
    pub fn new(client: DaemonClient, ctx: ShellContext, poller: StreamingPoller) -> Self {
        Self {
            client,
            ctx,
            poller,
        }
    }

    pub fn poller(&self) -> &StreamingPoller {
        &self.poller
    }

    /// Idle: start, refresh, start polling. Recording: stop, refresh, stop
    /// polling. Failures are surfaced and leave state untouched.
    pub async fn toggle(&self) -> Result<RecordingState, ControllerError> {
        let res = self.toggle_inner().await;
        if let Err(e) = &res {
            self.ctx.observer().recording_error(&e.to_string());
        }
        res
    }

    async fn toggle_inner(&self) -> Result<RecordingState, ControllerError> {
        self.ensure_reachable().await?;

        let command = if self.ctx.recording().await.is_recording() {
            Command::ListenStop
        } else {
            Command::ListenStart
        };

        if let Err(e) = self.client.call(&command).await {
            log::warn!("{} failed: {e:#}", command.method());
            return Err(ControllerError::Command(self.ctx.messages().error(e)));
        }

        self.refresh_inner().await
    }

    /// Reconciles local state and the poller with the daemon's own view.
    pub async fn refresh(&self) -> Result<RecordingState, ControllerError> {
        let res = self.refresh_inner().await;
        if let Err(e) = &res {
            log::warn!("recording state refresh failed: {e}");
        }
        res
    }

    async fn refresh_inner(&self) -> Result<RecordingState, ControllerError> {
        self.ensure_reachable().await?;

        let reply = self
            .client
            .call(&Command::IsListening)
            .await
            .map_err(|e| ControllerError::Command(self.ctx.messages().error(e)))?;

        let state = RecordingState::from_listening(parse_listening(&reply)?);
        self.ctx.set_recording(state).await;

        if state.is_recording() {
            self.poller.start().await;
        } else {
            self.poller.stop().await;
        }
        Ok(state)
    }

    async fn ensure_reachable(&self) -> Result<(), ControllerError> {
        if self.ctx.is_reachable().await {
            Ok(())
        } else {
            Err(ControllerError::Unavailable(
                self.ctx.messages().start_daemon.to_string(),
            ))
        }
    }
}

fn parse_listening(reply: &Reply) -> Result<bool, ControllerError> {
    match reply {
        Reply::Flag(b) => Ok(*b),
        // Some bridges stringify booleans.
        Reply::Text(t) => match t.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ControllerError::UnexpectedReply(other.to_string())),
        },
        Reply::Unit => Err(ControllerError::UnexpectedReply(String::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listening_reply_parsing() {
        assert_eq!(parse_listening(&Reply::Flag(true)), Ok(true));
        assert_eq!(parse_listening(&Reply::Text(" false ".into())), Ok(false));
        assert!(parse_listening(&Reply::Text("maybe".into())).is_err());
        assert!(parse_listening(&Reply::Unit).is_err());
    }
}
