use vfshell_core::protocol::Command;

/// Arguments of one method call, in D-Bus signature order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Args {
    None,
    /// `u`
    U32(u32),
    /// `s`
    Str(String),
    /// `us`
    U32Str(u32, String),
}

/// How the reply body is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// `s`: JSON text, or the bare liveness token.
    Text,
    /// `b`
    Flag,
    /// Empty body.
    Unit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: &'static str,
    pub args: Args,
    pub reply: ReplyKind,
}

impl MethodCall {
    /// `None` for commands the daemon does not serve over the bus.
    pub fn for_command(command: &Command) -> Option<Self> {
        let (args, reply) = match command {
            Command::ExportSession { .. } => return None,
            Command::IsListening => (Args::None, ReplyKind::Flag),
            Command::ListenStart | Command::ListenStop => (Args::None, ReplyKind::Unit),
            Command::Analyze(req) => (
                // The daemon takes an empty string for "no template".
                Args::U32Str(req.seconds, req.template.clone().unwrap_or_default()),
                ReplyKind::Text,
            ),
            Command::GetSessions { limit } => (Args::U32(*limit), ReplyKind::Text),
            Command::GetSessionDetail(id) => (Args::U32(id.0), ReplyKind::Text),
            Command::GetAnalytics(period) => (Args::Str(period.as_str().to_string()), ReplyKind::Text),
            Command::Ping
            | Command::GetStreamingTranscript
            | Command::GetSettings
            | Command::GetCapabilities => (Args::None, ReplyKind::Text),
        };
        Some(Self {
            method: command.method(),
            args,
            reply,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfshell_core::types::{AnalysisRequest, AnalyticsPeriod, ExportFormat, SessionId};

    #[test]
    fn commands_map_to_methods_and_signatures() {
        let call = MethodCall::for_command(&Command::GetSessions { limit: 50 }).unwrap();
        assert_eq!(call.method, "GetSessions");
        assert_eq!(call.args, Args::U32(50));
        assert_eq!(call.reply, ReplyKind::Text);

        let call = MethodCall::for_command(&Command::IsListening).unwrap();
        assert_eq!(call.reply, ReplyKind::Flag);

        let call = MethodCall::for_command(&Command::GetAnalytics(AnalyticsPeriod::month())).unwrap();
        assert_eq!(call.args, Args::Str("30d".into()));

        let call = MethodCall::for_command(&Command::ListenStop).unwrap();
        assert_eq!((call.args, call.reply), (Args::None, ReplyKind::Unit));
    }

    #[test]
    fn analyze_sends_empty_template_when_unset() {
        let req = AnalysisRequest::new(90, None).unwrap();
        let call = MethodCall::for_command(&Command::Analyze(req)).unwrap();
        assert_eq!(call.args, Args::U32Str(90, String::new()));

        let req = AnalysisRequest::new(30, Some("standup".into())).unwrap();
        let call = MethodCall::for_command(&Command::Analyze(req)).unwrap();
        assert_eq!(call.args, Args::U32Str(30, "standup".into()));
    }

    #[test]
    fn export_is_not_a_bus_method() {
        let cmd = Command::ExportSession {
            id: SessionId(1),
            format: ExportFormat::Md,
        };
        assert_eq!(MethodCall::for_command(&cmd), None);
    }
}
