use anyhow::Context;
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use vfshell_core::config::DaemonEndpoint;
use vfshell_core::protocol::DaemonSignal;
use vfshell_engine::traits::SignalSource;
use zbus::message::{Message, Type};
use zbus::{MatchRule, MessageStream};

use crate::bridge::SessionBus;

const QUEUE_LEN: usize = 16;

/// Subscribes to every signal the daemon emits on its interface.
pub struct DbusSignals {
    bus: SessionBus,
    endpoint: DaemonEndpoint,
}

impl DbusSignals {
    pub fn new(bus: SessionBus, endpoint: DaemonEndpoint) -> Self {
        Self { bus, endpoint }
    }

    fn rule(&self) -> zbus::Result<MatchRule<'_>> {
        Ok(MatchRule::builder()
            .msg_type(Type::Signal)
            .sender(self.endpoint.bus_name.as_str())?
            .path(self.endpoint.object_path.as_str())?
            .interface(self.endpoint.interface.as_str())?
            .build())
    }
}

#[async_trait]
impl SignalSource for DbusSignals {
    async fn subscribe(&self) -> anyhow::Result<BoxStream<'static, DaemonSignal>> {
        let conn = self.bus.connection().await?;
        let rule = self.rule().context("build signal match rule")?.into_owned();
        let stream = MessageStream::for_match_rule(rule, conn, Some(QUEUE_LEN))
            .await
            .context("subscribe to daemon signals")?;

        Ok(stream
            .filter_map(|res| async move {
                match res {
                    Ok(msg) => decode(&msg),
                    Err(e) => {
                        log::debug!("dropping malformed signal: {e}");
                        None
                    }
                }
            })
            .boxed())
    }
}

/// Unknown members and bodies with the wrong signature are skipped.
pub fn decode(msg: &Message) -> Option<DaemonSignal> {
    let header = msg.header();
    let member = header.member()?.as_str().to_string();
    let body = msg.body();

    let signal = match member.as_str() {
        "ListenStateChanged" => body
            .deserialize::<bool>()
            .map(|is_listening| DaemonSignal::ListenStateChanged { is_listening }),
        "AnalysisDone" => body
            .deserialize::<String>()
            .map(|status| DaemonSignal::AnalysisDone { status }),
        "TranscriptUpdated" => body
            .deserialize::<u32>()
            .map(|session_id| DaemonSignal::TranscriptUpdated { session_id }),
        "TranscriptChunk" => body.deserialize::<(String, String, u32, bool)>().map(
            |(text, speaker, timestamp_ms, is_final)| DaemonSignal::TranscriptChunk {
                text,
                speaker,
                timestamp_ms,
                is_final,
            },
        ),
        other => {
            log::debug!("ignoring daemon signal {other}");
            return None;
        }
    };

    match signal {
        Ok(signal) => Some(signal),
        Err(e) => {
            log::warn!("daemon signal {member} has an unexpected body: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfshell_core::config::{DEFAULT_INTERFACE, DEFAULT_OBJECT_PATH};

    fn signal<B>(member: &str, body: &B) -> Message
    where
        B: serde::Serialize + zbus::zvariant::DynamicType,
    {
        Message::signal(DEFAULT_OBJECT_PATH, DEFAULT_INTERFACE, member)
            .unwrap()
            .build(body)
            .unwrap()
    }

    #[test]
    fn decodes_known_signals() {
        assert_eq!(
            decode(&signal("ListenStateChanged", &(true,))),
            Some(DaemonSignal::ListenStateChanged { is_listening: true })
        );
        assert_eq!(
            decode(&signal("AnalysisDone", &("ok",))),
            Some(DaemonSignal::AnalysisDone {
                status: "ok".into()
            })
        );
        assert_eq!(
            decode(&signal("TranscriptUpdated", &(9u32,))),
            Some(DaemonSignal::TranscriptUpdated { session_id: 9 })
        );
        assert_eq!(
            decode(&signal("TranscriptChunk", &("hi", "SPEAKER_00", 1200u32, false))),
            Some(DaemonSignal::TranscriptChunk {
                text: "hi".into(),
                speaker: "SPEAKER_00".into(),
                timestamp_ms: 1200,
                is_final: false,
            })
        );
    }

    #[test]
    fn skips_unknown_and_mistyped_signals() {
        assert_eq!(decode(&signal("SomethingNew", &(1u32,))), None);
        assert_eq!(decode(&signal("ListenStateChanged", &("yes",))), None);
    }

    #[test]
    fn match_rule_targets_the_daemon() {
        let signals = DbusSignals::new(SessionBus::new(), DaemonEndpoint::default());
        let rule = signals.rule().unwrap().to_string();
        assert!(rule.contains("type='signal'"));
        assert!(rule.contains("sender='com.voiceforge.App'"));
        assert!(rule.contains("path='/com/voiceforge/App'"));
    }
}
