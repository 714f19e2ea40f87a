use vfshell_core::types::{AnalysisRequest, AnalyticsPeriod, ExportFormat, SessionId};
use vfshell_engine::router::Tab;

pub const HELP: &str = "\
commands:
  status                     show daemon and recording state
  retry                      probe the daemon again
  toggle                     start or stop recording
  tab <record|sessions|costs|settings>
  open <id>                  show one session
  export <id> <md|pdf>       export a session
  period <7d|30d>            switch the cost analytics window
  analyze [seconds] [template]
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Help,
    Status,
    Retry,
    Toggle,
    Tab(Tab),
    Open(SessionId),
    Export(SessionId, ExportFormat),
    Period(AnalyticsPeriod),
    Analyze(AnalysisRequest),
    Quit,
}

/// `Ok(None)` for a blank line. Input errors are rejected here, before any
/// daemon call.
pub fn parse(line: &str) -> Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let input = match (cmd.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("help" | "?", _) => Input::Help,
        ("status", []) => Input::Status,
        ("retry", []) => Input::Retry,
        ("toggle" | "rec", []) => Input::Toggle,
        ("tab", [name]) => Input::Tab(name.parse::<Tab>()?),
        ("open", [id]) => Input::Open(session_id(id)?),
        ("export", [id, format]) => {
            Input::Export(session_id(id)?, format.parse::<ExportFormat>().map_err(|e| e.to_string())?)
        }
        ("period", [p]) => Input::Period(AnalyticsPeriod::parse(p).map_err(|e| e.to_string())?),
        ("analyze", args) => {
            let seconds = args.first().copied().unwrap_or_default();
            let template = args.get(1..).map(|t| t.join(" ")).unwrap_or_default();
            Input::Analyze(AnalysisRequest::from_input(seconds, &template).map_err(|e| e.to_string())?)
        }
        ("quit" | "exit" | "q", []) => Input::Quit,
        (other, _) => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(input))
}

fn session_id(raw: &str) -> Result<SessionId, String> {
    raw.parse()
        .map_err(|_| format!("not a session id: {raw}"))
}
