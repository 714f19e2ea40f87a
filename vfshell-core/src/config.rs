use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::messages::Locale;
use crate::types::AnalyticsPeriod;

pub const DEFAULT_BUS_NAME: &str = "com.voiceforge.App";
pub const DEFAULT_OBJECT_PATH: &str = "/com/voiceforge/App";
pub const DEFAULT_INTERFACE: &str = "com.voiceforge.App";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonEndpoint {
    pub bus_name: String,
    pub object_path: String,
    pub interface: String,
}

impl Default for DaemonEndpoint {
    fn default() -> Self {
        Self {
            bus_name: DEFAULT_BUS_NAME.into(),
            object_path: DEFAULT_OBJECT_PATH.into(),
            interface: DEFAULT_INTERFACE.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub daemon: DaemonEndpoint,

    // Upper bound for any single daemon call, the liveness probe included.
    pub call_timeout_ms: u64,
    // Analysis runs the whole pipeline and routinely outlives a normal call.
    pub analysis_timeout_ms: u64,
    pub poll_interval_ms: u64,

    pub session_list_limit: u32,
    pub default_analytics_period: AnalyticsPeriod,

    // Session export is delegated to the daemon's command-line front end.
    pub export_program: String,

    pub locale: Locale,
    pub signals_enabled: bool,
}

impl ShellConfig {
    const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms.max(1))
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_millis(self.analysis_timeout_ms).max(self.call_timeout())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms).max(Self::MIN_POLL_INTERVAL)
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            daemon: DaemonEndpoint::default(),
            call_timeout_ms: 30_000,
            analysis_timeout_ms: 600_000,
            poll_interval_ms: 1_500,
            session_list_limit: 50,
            default_analytics_period: AnalyticsPeriod::week(),
            export_program: "voiceforge".into(),
            locale: Locale::En,
            signals_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: ShellConfig =
            serde_json::from_str(r#"{"locale":"ru","daemon":{"bus_name":"org.test.App"}}"#)
                .unwrap();
        assert_eq!(cfg.locale, Locale::Ru);
        assert_eq!(cfg.daemon.bus_name, "org.test.App");
        assert_eq!(cfg.daemon.object_path, DEFAULT_OBJECT_PATH);
        assert_eq!(cfg.poll_interval(), Duration::from_millis(1_500));
        assert_eq!(cfg.session_list_limit, 50);
    }

    #[test]
    fn poll_interval_has_a_floor() {
        let cfg = ShellConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(cfg.poll_interval(), Duration::from_millis(100));
    }
}
