//! Decoding of daemon replies into one canonical result shape.
//!
//! Every reply is decoded, never rejected: transport errors, undecodable
//! text and replies without an `ok` discriminator all become failure
//! envelopes so call sites only ever handle one failure shape.

use serde_json::{Map, Value, json};

use crate::messages::Messages;
use crate::protocol::Reply;

/// Error message used when a reply is not text at all.
pub const INVALID_RESPONSE: &str = "Invalid response";

/// Why an envelope is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The bridge itself failed or timed out.
    Transport,
    /// The reply was not decodable or carried no `ok` discriminator.
    Protocol,
    /// The daemon answered `ok: false`.
    Application,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub ok: bool,
    pub data: Option<Map<String, Value>>,
    pub error: Option<Value>,
    pub schema_version: Option<String>,
    failure: Option<FailureClass>,
    // Parsed reply body, kept so payloads from daemons that do not wrap
    // their replies can still be located.
    body: Option<Value>,
}

impl Envelope {
    pub fn decode(reply: &Reply) -> Self {
        match reply.as_text() {
            Some(raw) => Self::decode_text(raw),
            None => Self::protocol_failure(json!({ "message": INVALID_RESPONSE }), None),
        }
    }

    pub fn decode_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::protocol_failure(json!({ "message": INVALID_RESPONSE }), None);
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(body) => Self::from_body(body),
            Err(_) => Self::protocol_failure(json!({ "message": raw }), None),
        }
    }

    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(json!({ "message": message.into() })),
            schema_version: None,
            failure: Some(FailureClass::Transport),
            body: None,
        }
    }

    fn protocol_failure(error: Value, body: Option<Value>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
            schema_version: None,
            failure: Some(FailureClass::Protocol),
            body,
        }
    }

    fn from_body(body: Value) -> Self {
        let Some(ok) = body.get("ok").and_then(Value::as_bool) else {
            return Self::protocol_failure(body.clone(), Some(body));
        };

        let schema_version = ["schema_version", "schemaVersion"]
            .iter()
            .find_map(|k| body.get(*k))
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        if ok {
            let data = body
                .get("data")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            Self {
                ok: true,
                data: Some(data),
                error: None,
                schema_version,
                failure: None,
                body: Some(body),
            }
        } else {
            let error = body
                .get("error")
                .filter(|e| !e.is_null())
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            Self {
                ok: false,
                data: None,
                error: Some(error),
                schema_version,
                failure: Some(FailureClass::Application),
                body: Some(body),
            }
        }
    }

    pub fn failure(&self) -> Option<FailureClass> {
        self.failure
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// A structured reply that did not use the envelope format at all.
    pub fn is_bare(&self) -> bool {
        self.failure == Some(FailureClass::Protocol) && self.body.is_some()
    }

    /// Whether payload extraction may look at this envelope.
    pub fn carries_payload(&self) -> bool {
        self.ok || self.is_bare()
    }

    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }

    /// Human-readable failure text. Total: always returns something.
    pub fn error_message(&self, messages: &Messages) -> String {
        if let Some(err) = &self.error {
            if let Some(message) = err
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
            {
                return message.to_string();
            }
            if !self.ok && !is_blank(err) {
                return serde_json::to_string(err)
                    .unwrap_or_else(|_| messages.generic_failure.to_string());
            }
        }
        messages.generic_failure.to_string()
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{EN, RU};

    #[test]
    fn decodes_success_envelope() {
        let env = Envelope::decode_text(
            r#"{"schema_version":"1.0","ok":true,"data":{"sessions":[]}}"#,
        );
        assert!(env.ok);
        assert_eq!(env.schema_version.as_deref(), Some("1.0"));
        assert_eq!(env.data_field("sessions"), Some(&json!([])));
        assert!(env.error.is_none());
        assert_eq!(env.failure(), None);
    }

    #[test]
    fn decodes_application_failure() {
        let env = Envelope::decode_text(
            r#"{"schema_version":"1.0","ok":false,"error":{"code":"INVALID_SECONDS","message":"seconds must be 1..3600, got 0"}}"#,
        );
        assert!(!env.ok);
        assert!(env.data.is_none());
        assert_eq!(env.failure(), Some(FailureClass::Application));
        assert_eq!(env.error_message(&EN), "seconds must be 1..3600, got 0");
        assert!(!env.carries_payload());
    }

    #[test]
    fn non_text_reply_is_invalid_response() {
        for reply in [Reply::Flag(true), Reply::Unit] {
            let env = Envelope::decode(&reply);
            assert!(!env.ok);
            assert_eq!(env.failure(), Some(FailureClass::Protocol));
            assert_eq!(env.error_message(&EN), INVALID_RESPONSE);
        }
    }

    #[test]
    fn malformed_text_reports_raw_text() {
        let env = Envelope::decode_text("Ошибка: model not loaded");
        assert!(!env.ok);
        assert!(!env.is_bare());
        assert_eq!(env.error_message(&EN), "Ошибка: model not loaded");
    }

    #[test]
    fn empty_text_is_invalid_response() {
        let env = Envelope::decode_text("   ");
        assert!(!env.ok);
        assert_eq!(env.error_message(&EN), INVALID_RESPONSE);
    }

    #[test]
    fn missing_discriminator_keeps_structure_as_error() {
        let env = Envelope::decode_text(r#"{"model_size":"small"}"#);
        assert!(!env.ok);
        assert!(env.is_bare());
        assert_eq!(env.error, Some(json!({"model_size": "small"})));
        assert_eq!(env.error_message(&EN), r#"{"model_size":"small"}"#);

        // A non-boolean `ok` is not a discriminator either.
        let env = Envelope::decode_text(r#"{"ok":"yes"}"#);
        assert!(env.is_bare());
    }

    #[test]
    fn error_message_fallback_chain() {
        let env = Envelope::decode_text(r#"{"ok":false,"error":{"code":"E1"}}"#);
        assert_eq!(env.error_message(&EN), r#"{"code":"E1"}"#);

        let env = Envelope::decode_text(r#"{"ok":false,"error":{"message":""}}"#);
        assert_eq!(env.error_message(&EN), r#"{"message":""}"#);

        let env = Envelope::decode_text(r#"{"ok":false}"#);
        assert_eq!(env.error, Some(json!({})));
        assert_eq!(env.error_message(&RU), "Ошибка");

        let env = Envelope::decode_text(r#"{"ok":true}"#);
        assert_eq!(env.error_message(&EN), "Error");
    }

    #[test]
    fn transport_failure_message() {
        let env = Envelope::transport_failure("org.freedesktop.DBus.Error.ServiceUnknown");
        assert_eq!(env.failure(), Some(FailureClass::Transport));
        assert!(!env.carries_payload());
        assert_eq!(
            env.error_message(&EN),
            "org.freedesktop.DBus.Error.ServiceUnknown"
        );
    }

    #[test]
    fn decoding_is_total_for_odd_inputs() {
        for raw in ["null", "42", "\"pong\"", "[1,2]", "{", "true", "\u{0}"] {
            let env = Envelope::decode_text(raw);
            assert!(!env.ok, "{raw}");
            assert!(!env.error_message(&EN).is_empty());
        }
    }
}
