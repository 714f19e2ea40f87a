use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vfshell_core::config::ShellConfig;
use vfshell_core::payload;
use vfshell_core::protocol::{Command, DaemonSignal};
use vfshell_core::types::{
    AnalysisRequest, AnalyticsPeriod, Availability, ExportFormat, RecordingState, SessionId,
};
use vfshell_dbus::{DbusBridge, DbusSignals, SessionBus};
use vfshell_engine::analysis::{AnalysisOutcome, AnalysisRunner};
use vfshell_engine::availability::AvailabilityMonitor;
use vfshell_engine::client::DaemonClient;
use vfshell_engine::context::{ShellContext, ShellSnapshot};
use vfshell_engine::error::ControllerError;
use vfshell_engine::poller::StreamingPoller;
use vfshell_engine::recording::RecordingController;
use vfshell_engine::router::{Tab, TabRouter};
use vfshell_engine::signals::{SignalHandler, SignalTask, spawn_listener};
use vfshell_engine::traits::{
    DaemonBridge, Notification, ShellObserver, SignalSource, Topic,
};
use vfshell_engine::views::{LoadOutcome, ViewLoaders};
use vfshell_runtime::config_store::ConfigStore;
use vfshell_runtime::export::CliExporter;

/// Composition root of the shell. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ShellService {
    config: Arc<ShellConfig>,
    ctx: ShellContext,
    client: DaemonClient,
    monitor: AvailabilityMonitor,
    recording: RecordingController,
    router: TabRouter,
    analysis: AnalysisRunner,
    signals: Option<Arc<dyn SignalSource>>,
    signal_task: Arc<Mutex<Option<SignalTask>>>,
}

impl ShellService {
    pub fn new(
        config: ShellConfig,
        bridge: Arc<dyn DaemonBridge>,
        signals: Option<Arc<dyn SignalSource>>,
        observer: Arc<dyn ShellObserver>,
    ) -> Self {
        let ctx = ShellContext::new(observer, config.locale.messages());
        let client = DaemonClient::new(bridge, config.call_timeout());

        let monitor = AvailabilityMonitor::new(client.clone(), ctx.clone());
        let poller = StreamingPoller::new(client.clone(), ctx.clone(), config.poll_interval());
        let recording = RecordingController::new(client.clone(), ctx.clone(), poller);
        let loaders = ViewLoaders::new(client.clone(), ctx.clone(), config.session_list_limit);
        let router = TabRouter::new(
            loaders,
            monitor.clone(),
            config.default_analytics_period.clone(),
        );
        let analysis = AnalysisRunner::new(
            client.clone(),
            ctx.clone(),
            router.clone(),
            config.analysis_timeout(),
        );

        let signals = if config.signals_enabled { signals } else { None };

        Self {
            config: Arc::new(config),
            ctx,
            client,
            monitor,
            recording,
            router,
            analysis,
            signals,
            signal_task: Arc::new(Mutex::new(None)),
        }
    }

    /// Loads the config at `config_store` and wires the D-Bus bridge, the CLI
    /// exporter and the signal subscription.
    pub fn connect(
        config_store: &ConfigStore,
        observer: Arc<dyn ShellObserver>,
    ) -> anyhow::Result<Self> {
        let config = config_store.load()?;
        let bus = SessionBus::new();
        let exporter = Arc::new(CliExporter::new(config.export_program.clone()));
        let bridge = Arc::new(DbusBridge::new(
            bus.clone(),
            config.daemon.clone(),
            exporter,
        ));
        let signals = Arc::new(DbusSignals::new(bus, config.daemon.clone()));
        Ok(Self::new(config, bridge, Some(signals), observer))
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub async fn snapshot(&self) -> ShellSnapshot {
        self.ctx.snapshot().await
    }

    /// Probe; when reachable, log the daemon's capabilities, reconcile
    /// recording state and load settings.
    pub async fn startup(&self) -> Availability {
        self.start_signals();

        let availability = self.monitor.probe().await;
        if availability.is_reachable() {
            self.log_capabilities().await;
            if let Err(e) = self.recording.refresh().await {
                log::debug!("recording state not reconciled at startup: {e}");
            }
            self.router.reload_settings().await;
        }
        availability
    }

    /// User-triggered re-probe.
    pub async fn retry(&self) -> Availability {
        let availability = self.monitor.probe().await;
        if availability.is_reachable() {
            if let Err(e) = self.recording.refresh().await {
                log::debug!("recording state not reconciled on retry: {e}");
            }
            self.router.reload_settings().await;
            self.router.reload_sessions().await;
        }
        availability
    }

    pub async fn toggle_recording(&self) -> Result<RecordingState, ControllerError> {
        self.recording.toggle().await
    }

    pub async fn activate_tab(&self, tab: Tab) -> Option<LoadOutcome> {
        self.router.activate(tab).await
    }

    pub async fn open_session(&self, id: SessionId) -> LoadOutcome {
        self.router.open_session(id).await
    }

    pub async fn export_session(&self, id: SessionId, format: ExportFormat) -> Notification {
        self.router.loaders().export_session(id, format).await
    }

    pub async fn select_period(&self, period: AnalyticsPeriod) -> LoadOutcome {
        self.router.select_period(period).await
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisOutcome {
        self.analysis.analyze(request).await
    }

    /// Stops polling and the signal subscription. Leaves the daemon alone:
    /// an active recording keeps running.
    pub async fn shutdown(&self) {
        self.recording.poller().stop().await;
        let task = self
            .signal_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if task.is_some() {
            log::info!("daemon signal listener stopped");
        }
    }

    fn start_signals(&self) {
        let Some(source) = self.signals.clone() else {
            return;
        };
        let mut slot = self.signal_task.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }
        let reactor = Arc::new(SignalReactor {
            ctx: self.ctx.clone(),
            recording: self.recording.clone(),
            router: self.router.clone(),
        });
        *slot = Some(spawn_listener(source, reactor));
    }

    async fn log_capabilities(&self) {
        let env = self.client.query(&Command::GetCapabilities).await;
        match payload::capabilities(&env) {
            Some(caps) => log::info!(
                "daemon api {} (envelope_v1={})",
                caps.api_version.as_deref().unwrap_or("unknown"),
                caps.envelope_v1()
            ),
            None => log::debug!(
                "daemon capabilities unavailable: {}",
                env.error_message(self.ctx.messages())
            ),
        }
    }
}

/// Reacts to daemon signals. Holds no reference to the service so the
/// listener task never keeps it alive.
struct SignalReactor {
    ctx: ShellContext,
    recording: RecordingController,
    router: TabRouter,
}

#[async_trait]
impl SignalHandler for SignalReactor {
    async fn on_signal(&self, signal: DaemonSignal) {
        match signal {
            DaemonSignal::ListenStateChanged { is_listening } => {
                log::info!("daemon reports listening={is_listening}");
                if let Err(e) = self.recording.refresh().await {
                    log::debug!("recording state not reconciled after signal: {e}");
                }
            }
            DaemonSignal::AnalysisDone { status } => {
                let messages = self.ctx.messages();
                self.ctx.observer().notify(&Notification::info(
                    Topic::Analysis,
                    format!("{} ({status})", messages.analysis_done),
                ));
            }
            DaemonSignal::TranscriptUpdated { session_id } => {
                if self.router.active_tab() == Some(Tab::Sessions) {
                    log::debug!("session {session_id} updated; reloading list");
                    self.router.reload_sessions().await;
                }
            }
            DaemonSignal::TranscriptChunk { .. } => {
                // Live text comes from the poller.
            }
        }
    }
}
