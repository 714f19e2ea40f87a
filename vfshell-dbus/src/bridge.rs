use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::OnceCell;
use vfshell_core::config::DaemonEndpoint;
use vfshell_core::protocol::{Command, Reply};
use vfshell_engine::traits::{DaemonBridge, SessionExporter};
use zbus::Connection;

use crate::request::MethodCall;
use crate::runtime;

/// Session-bus connection shared by the bridge and the signal listener.
/// Connects on first use.
#[derive(Clone, Default)]
pub struct SessionBus {
    conn: Arc<OnceCell<Connection>>,
}

impl SessionBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connection(&self) -> anyhow::Result<&Connection> {
        self.conn
            .get_or_try_init(|| async {
                log::debug!("connecting to the D-Bus session bus");
                Connection::session().await
            })
            .await
            .context("connect to D-Bus session bus")
    }
}

/// Daemon bridge over the session bus. Session export is not served on the
/// bus and goes to `exporter` instead.
pub struct DbusBridge {
    bus: SessionBus,
    endpoint: DaemonEndpoint,
    exporter: Arc<dyn SessionExporter>,
}

impl DbusBridge {
    pub fn new(bus: SessionBus, endpoint: DaemonEndpoint, exporter: Arc<dyn SessionExporter>) -> Self {
        Self {
            bus,
            endpoint,
            exporter,
        }
    }
}

#[async_trait]
impl DaemonBridge for DbusBridge {
    async fn call(&self, command: &Command) -> anyhow::Result<Reply> {
        if let Command::ExportSession { id, format } = command {
            return self.exporter.export(*id, *format).await.map(Reply::Text);
        }

        let Some(call) = MethodCall::for_command(command) else {
            anyhow::bail!("{} has no D-Bus method", command.method());
        };
        let conn = self.bus.connection().await?;
        runtime::execute(conn, &self.endpoint, &call).await
    }
}
