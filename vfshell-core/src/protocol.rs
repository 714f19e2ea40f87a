// Command/response and signal vocabulary shared with the daemon.

use serde::{Deserialize, Serialize};

use crate::types::{AnalysisRequest, AnalyticsPeriod, ExportFormat, SessionId};

/// Exact reply the daemon gives to a liveness probe.
pub const LIVENESS_TOKEN: &str = "pong";

pub const ANALYZE_MAX_SECONDS: u32 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    IsListening,
    ListenStart,
    ListenStop,
    GetStreamingTranscript,
    Analyze(AnalysisRequest),
    GetSessions { limit: u32 },
    GetSessionDetail(SessionId),
    ExportSession { id: SessionId, format: ExportFormat },
    GetAnalytics(AnalyticsPeriod),
    GetSettings,
    GetCapabilities,
}

impl Command {
    /// Method name on the daemon interface.
    pub fn method(&self) -> &'static str {
        match self {
            Command::Ping => "Ping",
            Command::IsListening => "IsListening",
            Command::ListenStart => "ListenStart",
            Command::ListenStop => "ListenStop",
            Command::GetStreamingTranscript => "GetStreamingTranscript",
            Command::Analyze(_) => "Analyze",
            Command::GetSessions { .. } => "GetSessions",
            Command::GetSessionDetail(_) => "GetSessionDetail",
            Command::ExportSession { .. } => "ExportSession",
            Command::GetAnalytics(_) => "GetAnalytics",
            Command::GetSettings => "GetSettings",
            Command::GetCapabilities => "GetCapabilities",
        }
    }
}

/// Raw reply as it comes off the bridge, before envelope decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Flag(bool),
    Unit,
}

impl Reply {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Daemon-initiated notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DaemonSignal {
    ListenStateChanged {
        is_listening: bool,
    },
    AnalysisDone {
        status: String,
    },
    TranscriptUpdated {
        session_id: u32,
    },
    TranscriptChunk {
        text: String,
        speaker: String,
        timestamp_ms: u32,
        is_final: bool,
    },
}
