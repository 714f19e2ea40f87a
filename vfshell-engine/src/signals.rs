use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use vfshell_core::protocol::DaemonSignal;

use crate::traits::SignalSource;

#[async_trait]
pub trait SignalHandler: Send + Sync {
    async fn on_signal(&self, signal: DaemonSignal);
}

/// Background signal consumer. Dropping it stops the subscription.
pub struct SignalTask {
    task: JoinHandle<()>,
}

impl SignalTask {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SignalTask {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Subscribes on a background task and feeds every signal to `handler`, in
/// arrival order. A failed subscription is logged; polling keeps working
/// without signals.
pub fn spawn_listener(source: Arc<dyn SignalSource>, handler: Arc<dyn SignalHandler>) -> SignalTask {
    let task = tokio::spawn(async move {
        let mut stream = match source.subscribe().await {
            Ok(stream) => stream,
            Err(e) => {
                log::warn!("daemon signal subscription failed: {e:#}");
                return;
            }
        };
        log::info!("listening for daemon signals");

        while let Some(signal) = stream.next().await {
            log::debug!("daemon signal: {signal:?}");
            handler.on_signal(signal).await;
        }
        log::info!("daemon signal stream ended");
    });
    SignalTask { task }
}
