use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InputError;
use crate::protocol::ANALYZE_MAX_SECONDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(SessionId)
    }
}

/// Process-wide reachability of the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Unreachable,
    Reachable,
}

impl Availability {
    pub fn is_reachable(self) -> bool {
        self == Availability::Reachable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
}

impl RecordingState {
    pub fn from_listening(is_listening: bool) -> Self {
        if is_listening {
            RecordingState::Recording
        } else {
            RecordingState::Idle
        }
    }

    pub fn is_recording(self) -> bool {
        self == RecordingState::Recording
    }
}

/// One row of the session list. Every field is optional because daemons of
/// different ages name them differently.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Option<SessionId>,
    pub started_at: Option<String>,
    pub duration_sec: Option<f64>,
    pub segments_count: Option<u64>,
}

impl SessionSummary {
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let id = ["id", "session_id"]
            .iter()
            .filter_map(|k| obj.get(*k))
            .find_map(|v| match v {
                Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .map(SessionId);

        let started_at = ["started_at", "created_at"]
            .iter()
            .filter_map(|k| obj.get(*k))
            .find_map(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        Some(Self {
            id,
            started_at,
            duration_sec: obj.get("duration_sec").and_then(Value::as_f64),
            segments_count: obj.get("segments_count").and_then(Value::as_u64),
        })
    }
}

/// Reporting window for cost analytics, e.g. `7d`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AnalyticsPeriod(String);

impl AnalyticsPeriod {
    pub fn week() -> Self {
        Self("7d".into())
    }

    pub fn month() -> Self {
        Self("30d".into())
    }

    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let raw = raw.trim().to_ascii_lowercase();
        let days = raw.strip_suffix('d').unwrap_or_default();
        if days.is_empty() || !days.bytes().all(|b| b.is_ascii_digit()) || days == "0" {
            return Err(InputError::AnalyticsPeriod(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AnalyticsPeriod {
    fn default() -> Self {
        Self::week()
    }
}

impl fmt::Display for AnalyticsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AnalyticsPeriod {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AnalyticsPeriod> for String {
    fn from(value: AnalyticsPeriod) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Md,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Md => "md",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(ExportFormat::Md),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(InputError::ExportFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub seconds: u32,
    pub template: Option<String>,
}

impl AnalysisRequest {
    pub const DEFAULT_SECONDS: u32 = 30;

    pub fn new(seconds: u32, template: Option<String>) -> Result<Self, InputError> {
        if seconds == 0 || seconds > ANALYZE_MAX_SECONDS {
            return Err(InputError::AnalysisSeconds {
                got: seconds,
                max: ANALYZE_MAX_SECONDS,
            });
        }
        let template = template
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Ok(Self { seconds, template })
    }

    /// Builds a request from free-form form input: a non-numeric duration
    /// falls back to the default.
    pub fn from_input(seconds: &str, template: &str) -> Result<Self, InputError> {
        let seconds = seconds.trim().parse().unwrap_or(Self::DEFAULT_SECONDS);
        Self::new(seconds, Some(template.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub features: serde_json::Map<String, Value>,
}

impl Capabilities {
    pub fn envelope_v1(&self) -> bool {
        self.features
            .get("envelope_v1")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_summary_accepts_alternate_field_names() {
        let s = SessionSummary::from_value(&json!({
            "session_id": "12",
            "created_at": "2024-05-01T10:00:00",
            "duration_sec": 61.5
        }))
        .unwrap();
        assert_eq!(s.id, Some(SessionId(12)));
        assert_eq!(s.started_at.as_deref(), Some("2024-05-01T10:00:00"));
        assert_eq!(s.duration_sec, Some(61.5));
        assert_eq!(s.segments_count, None);
    }

    #[test]
    fn session_summary_prefers_primary_names() {
        let s = SessionSummary::from_value(&json!({
            "id": 3,
            "session_id": 4,
            "started_at": "a",
            "created_at": "b"
        }))
        .unwrap();
        assert_eq!(s.id, Some(SessionId(3)));
        assert_eq!(s.started_at.as_deref(), Some("a"));
    }

    #[test]
    fn session_summary_rejects_non_objects() {
        assert!(SessionSummary::from_value(&json!("x")).is_none());
    }

    #[test]
    fn export_format_is_case_insensitive_and_strict() {
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert_eq!("md".parse::<ExportFormat>(), Ok(ExportFormat::Md));
        assert!("docx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn analytics_period_validation() {
        assert_eq!(AnalyticsPeriod::parse("30D").unwrap().as_str(), "30d");
        assert!(AnalyticsPeriod::parse("d").is_err());
        assert!(AnalyticsPeriod::parse("0d").is_err());
        assert!(AnalyticsPeriod::parse("7w").is_err());
        let p: AnalyticsPeriod = serde_json::from_value(json!("7d")).unwrap();
        assert_eq!(p, AnalyticsPeriod::week());
        assert!(serde_json::from_value::<AnalyticsPeriod>(json!("week")).is_err());
    }

    #[test]
    fn analysis_request_bounds_and_defaults() {
        let req = AnalysisRequest::from_input("abc", "  ").unwrap();
        assert_eq!(req.seconds, AnalysisRequest::DEFAULT_SECONDS);
        assert_eq!(req.template, None);

        let req = AnalysisRequest::from_input("120", "standup").unwrap();
        assert_eq!(req.seconds, 120);
        assert_eq!(req.template.as_deref(), Some("standup"));

        assert!(AnalysisRequest::new(0, None).is_err());
        assert!(AnalysisRequest::new(ANALYZE_MAX_SECONDS + 1, None).is_err());
    }

    #[test]
    fn capabilities_feature_flag() {
        let caps: Capabilities = serde_json::from_value(json!({
            "api_version": "1.0",
            "features": {"envelope_v1": true}
        }))
        .unwrap();
        assert!(caps.envelope_v1());
        assert!(!Capabilities::default().envelope_v1());
    }
}
