use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use vfshell_core::envelope::Envelope;
use vfshell_core::payload;
use vfshell_core::protocol::Command;

use crate::client::DaemonClient;
use crate::context::ShellContext;

/// Owns the polling task. Dropping the handle aborts the task, so a handle
/// that leaves the shared context on any path takes its timer with it.
pub struct PollerHandle {
    task: JoinHandle<()>,
    generation: u64,
}

impl PollerHandle {
    pub fn cancel(self) {
        log::debug!("cancelling streaming poller #{}", self.generation);
        // Drop aborts.
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Periodically fetches the live transcript while recording.
#[derive(Clone)]
pub struct StreamingPoller {
    client: DaemonClient,
    ctx: ShellContext,
    interval: Duration,
}

impl StreamingPoller {
    pub fn new(client: DaemonClient, ctx: ShellContext, interval: Duration) -> Self {
        Self {
            client,
            ctx,
            interval,
        }
    }

    /// No-op when a poller is already running, the daemon is unreachable, or
    /// recording is not active.
    pub async fn start(&self) -> bool {
        let client = self.client.clone();
        let ctx = self.ctx.clone();
        let interval = self.interval;

        let started = self
            .ctx
            .install_poller(move |generation| PollerHandle {
                task: tokio::spawn(run(client, ctx, interval, generation)),
                generation,
            })
            .await;

        if started {
            log::info!("streaming poller started (every {}ms)", interval.as_millis());
        }
        started
    }

    pub async fn stop(&self) -> bool {
        let stopped = self.ctx.remove_poller().await;
        if stopped {
            log::info!("streaming poller stopped");
        }
        stopped
    }
}

async fn run(client: DaemonClient, ctx: ShellContext, interval: Duration, generation: u64) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the first fetch happens one
    // interval after start.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if !ctx.poll_allowed(generation).await {
            break;
        }

        let env: Envelope = client.query(&Command::GetStreamingTranscript).await;
        match payload::streaming_transcript(&env) {
            Some(snapshot) => {
                if !ctx.publish_streaming(generation, snapshot.render()).await {
                    break;
                }
            }
            None => {
                // Transient: keep whatever was rendered last.
                log::debug!(
                    "streaming poll failed: {}",
                    env.error_message(ctx.messages())
                );
            }
        }
    }
}
