use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use vfshell_core::types::{AnalyticsPeriod, SessionId};

use crate::availability::AvailabilityMonitor;
use crate::views::{LoadOutcome, ViewLoaders};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Record,
    Sessions,
    Costs,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Record, Tab::Sessions, Tab::Costs, Tab::Settings];

    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Record => "record",
            Tab::Sessions => "sessions",
            Tab::Costs => "costs",
            Tab::Settings => "settings",
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Tab::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown tab: {s}"))
    }
}

#[derive(Default)]
struct RouterState {
    active: Option<Tab>,
    in_flight: HashSet<Tab>,
}

/// Dispatches tab activation to exactly one view loader.
///
/// Loads are never cached: every activation re-fetches. A loader whose call
/// failed at the transport level triggers a liveness probe.
#[derive(Clone)]
pub struct TabRouter {
    loaders: ViewLoaders,
    monitor: AvailabilityMonitor,
    default_period: AnalyticsPeriod,
    state: Arc<Mutex<RouterState>>,
}

impl TabRouter {
    pub fn new(
        loaders: ViewLoaders,
        monitor: AvailabilityMonitor,
        default_period: AnalyticsPeriod,
    ) -> Self {
        Self {
            loaders,
            monitor,
            default_period,
            state: Arc::new(Mutex::new(RouterState::default())),
        }
    }

    pub fn loaders(&self) -> &ViewLoaders {
        &self.loaders
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.state().active
    }

    /// `None` when the tab has no loader or its previous load is still
    /// running.
    pub async fn activate(&self, tab: Tab) -> Option<LoadOutcome> {
        let _guard = {
            let mut state = self.state();
            state.active = Some(tab);
            if tab == Tab::Record {
                return None;
            }
            if !state.in_flight.insert(tab) {
                log::debug!("{tab} tab is already loading; activation skipped");
                return None;
            }
            InFlight {
                state: self.state.clone(),
                tab,
            }
        };

        let outcome = match tab {
            Tab::Record => return None,
            Tab::Sessions => self.loaders.load_sessions().await,
            Tab::Costs => {
                self.loaders
                    .load_analytics(self.default_period.clone())
                    .await
            }
            Tab::Settings => self.loaders.load_settings().await,
        };
        Some(self.settle(outcome).await)
    }

    /// Period switch inside the costs tab.
    pub async fn select_period(&self, period: AnalyticsPeriod) -> LoadOutcome {
        let outcome = self.loaders.load_analytics(period).await;
        self.settle(outcome).await
    }

    pub async fn open_session(&self, id: SessionId) -> LoadOutcome {
        let outcome = self.loaders.load_session_detail(id).await;
        self.settle(outcome).await
    }

    pub async fn reload_sessions(&self) -> LoadOutcome {
        let outcome = self.loaders.load_sessions().await;
        self.settle(outcome).await
    }

    pub async fn reload_settings(&self) -> LoadOutcome {
        let outcome = self.loaders.load_settings().await;
        self.settle(outcome).await
    }

    async fn settle(&self, outcome: LoadOutcome) -> LoadOutcome {
        if outcome.transport_failed {
            self.monitor.probe().await;
        }
        outcome
    }

    fn state(&self) -> MutexGuard<'_, RouterState> {
        // The state holds no invariants a panicking holder could break.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct InFlight {
    state: Arc<Mutex<RouterState>>,
    tab: Tab,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.in_flight.remove(&self.tab);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_names_parse() {
        assert_eq!("Costs".parse::<Tab>(), Ok(Tab::Costs));
        assert_eq!(" record ".parse::<Tab>(), Ok(Tab::Record));
        assert!("analytics".parse::<Tab>().is_err());
        for tab in Tab::ALL {
            assert_eq!(tab.to_string().parse::<Tab>(), Ok(tab));
        }
    }
}
