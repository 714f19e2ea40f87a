use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use vfshell_core::envelope::Envelope;
use vfshell_core::protocol::{Command, Reply};

use crate::traits::DaemonBridge;

/// Bridge wrapper that bounds every call and normalizes failures.
#[derive(Clone)]
pub struct DaemonClient {
    bridge: Arc<dyn DaemonBridge>,
    timeout: Duration,
}

impl DaemonClient {
    pub fn new(bridge: Arc<dyn DaemonBridge>, timeout: Duration) -> Self {
        Self { bridge, timeout }
    }

    pub async fn call(&self, command: &Command) -> anyhow::Result<Reply> {
        self.call_within(command, self.timeout).await
    }

    pub async fn call_within(&self, command: &Command, timeout: Duration) -> anyhow::Result<Reply> {
        match tokio::time::timeout(timeout, self.bridge.call(command)).await {
            Ok(res) => res,
            Err(_) => Err(anyhow!(
                "{} timed out after {}ms",
                command.method(),
                timeout.as_millis()
            )),
        }
    }

    /// Calls and decodes. Transport errors become failure envelopes.
    pub async fn query(&self, command: &Command) -> Envelope {
        self.query_within(command, self.timeout).await
    }

    pub async fn query_within(&self, command: &Command, timeout: Duration) -> Envelope {
        match self.call_within(command, timeout).await {
            Ok(reply) => Envelope::decode(&reply),
            Err(e) => {
                log::debug!("daemon call {} failed: {e:#}", command.method());
                Envelope::transport_failure(e.to_string())
            }
        }
    }
}
