//! Per-payload normalization of decoded envelopes.
//!
//! Daemons have shipped several reply shapes for the same payload: wrapped
//! under `data.<key>`, as a top-level `<key>`, or as the bare payload with no
//! envelope at all. Each payload type lists the shapes it accepts, in order of
//! preference; supporting a new shape is a change to one of these lists.

use serde_json::{Map, Value};

use crate::envelope::Envelope;
use crate::messages::Messages;
use crate::text::StreamingTranscript;
use crate::types::{Capabilities, SessionSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `{"ok": true, "data": {"<key>": ...}}`
    Namespaced(&'static str),
    /// `{"<key>": ...}`, with or without `ok` beside it.
    TopLevel(&'static str),
    /// The whole body of a reply with no envelope.
    Body,
}

pub const SESSIONS_SHAPES: &[Shape] = &[
    Shape::Namespaced("sessions"),
    Shape::TopLevel("sessions"),
    Shape::Body,
];

pub const SESSION_DETAIL_SHAPES: &[Shape] = &[
    Shape::Namespaced("session_detail"),
    Shape::TopLevel("session_detail"),
    Shape::Body,
];

pub const ANALYTICS_SHAPES: &[Shape] = &[
    Shape::Namespaced("analytics"),
    Shape::TopLevel("analytics"),
    Shape::Body,
];

pub const SETTINGS_SHAPES: &[Shape] = &[
    Shape::Namespaced("settings"),
    Shape::TopLevel("settings"),
    Shape::Body,
];

pub const STREAMING_SHAPES: &[Shape] = &[
    Shape::Namespaced("streaming_transcript"),
    Shape::TopLevel("streaming_transcript"),
    Shape::Body,
];

pub const ANALYSIS_SHAPES: &[Shape] = &[Shape::Namespaced("text")];

pub const EXPORT_SHAPES: &[Shape] = &[Shape::Namespaced("export")];

/// First non-null value found at one of `shapes`.
pub fn locate<'a>(env: &'a Envelope, shapes: &[Shape]) -> Option<&'a Value> {
    if !env.carries_payload() {
        return None;
    }

    shapes
        .iter()
        .find_map(|shape| match shape {
            Shape::Namespaced(key) => env.data_field(key),
            Shape::TopLevel(key) => env.body().and_then(|b| b.get(*key)),
            Shape::Body if env.is_bare() => env.body(),
            _ => None,
        })
        .filter(|v| !v.is_null())
}

pub fn sessions(env: &Envelope, messages: &Messages) -> Result<Vec<SessionSummary>, String> {
    if !env.carries_payload() {
        return Err(env.error_message(messages));
    }

    Ok(locate(env, SESSIONS_SHAPES)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(SessionSummary::from_value).collect())
        .unwrap_or_default())
}

pub fn session_detail(env: &Envelope, messages: &Messages) -> Result<Value, String> {
    document(env, SESSION_DETAIL_SHAPES, messages)
}

pub fn analytics(env: &Envelope, messages: &Messages) -> Result<Value, String> {
    document(env, ANALYTICS_SHAPES, messages)
}

pub fn settings(env: &Envelope, messages: &Messages) -> Result<Value, String> {
    document(env, SETTINGS_SHAPES, messages)
}

/// `None` means the snapshot is unusable and the caller keeps what it had.
pub fn streaming_transcript(env: &Envelope) -> Option<StreamingTranscript> {
    if !env.carries_payload() {
        return None;
    }
    match locate(env, STREAMING_SHAPES) {
        Some(v) => StreamingTranscript::from_value(v),
        None => Some(StreamingTranscript::default()),
    }
}

/// Text produced by a finished analysis. Only a successful envelope counts.
pub fn analysis_text(env: &Envelope) -> Option<&str> {
    if !env.ok {
        return None;
    }
    locate(env, ANALYSIS_SHAPES)
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
}

/// Location of an exported file, when the exporter reported one.
pub fn export_path(env: &Envelope, messages: &Messages) -> Result<Option<String>, String> {
    if !env.ok {
        return Err(env.error_message(messages));
    }
    Ok(locate(env, EXPORT_SHAPES)
        .and_then(|v| v.get("path").and_then(Value::as_str).or_else(|| v.as_str()))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string))
}

/// Capabilities are returned unwrapped by every daemon version seen so far.
pub fn capabilities(env: &Envelope) -> Option<Capabilities> {
    let v = locate(env, &[Shape::Namespaced("capabilities"), Shape::Body])?;
    serde_json::from_value(v.clone()).ok()
}

fn document(env: &Envelope, shapes: &[Shape], messages: &Messages) -> Result<Value, String> {
    if !env.carries_payload() {
        return Err(env.error_message(messages));
    }
    Ok(locate(env, shapes)
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::EN;
    use crate::types::SessionId;
    use serde_json::json;

    fn decode(raw: &str) -> Envelope {
        Envelope::decode_text(raw)
    }

    #[test]
    fn sessions_from_envelope() {
        let env = decode(r#"{"ok":true,"data":{"sessions":[{"id":1,"started_at":"t","duration_sec":5}]}}"#);
        let list = sessions(&env, &EN).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, Some(SessionId(1)));
    }

    #[test]
    fn sessions_from_top_level_and_bare_array() {
        let env = decode(r#"{"sessions":[{"id":2}]}"#);
        assert_eq!(sessions(&env, &EN).unwrap()[0].id, Some(SessionId(2)));

        let env = decode(r#"[{"session_id":3},{"id":4}]"#);
        let ids: Vec<_> = sessions(&env, &EN)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![Some(SessionId(3)), Some(SessionId(4))]);
    }

    #[test]
    fn missing_sessions_render_as_empty() {
        assert!(sessions(&decode(r#"{"ok":true,"data":{}}"#), &EN).unwrap().is_empty());
        assert!(sessions(&decode(r#"{"ok":true,"data":{"sessions":null}}"#), &EN).unwrap().is_empty());
        assert!(sessions(&decode(r#"{"sessions":"nope"}"#), &EN).unwrap().is_empty());
    }

    #[test]
    fn application_failure_is_reported() {
        let env = decode(r#"{"ok":false,"error":{"message":"db locked"}}"#);
        assert_eq!(sessions(&env, &EN), Err("db locked".to_string()));
        assert_eq!(settings(&env, &EN), Err("db locked".to_string()));
    }

    #[test]
    fn unparseable_reply_is_reported() {
        assert_eq!(analytics(&decode("boom"), &EN), Err("boom".to_string()));
    }

    #[test]
    fn documents_prefer_namespaced_then_top_level_then_body() {
        let env = decode(r#"{"ok":true,"data":{"settings":{"model_size":"small"}}}"#);
        assert_eq!(settings(&env, &EN).unwrap(), json!({"model_size": "small"}));

        let env = decode(r#"{"settings":{"model_size":"tiny"},"extra":1}"#);
        assert_eq!(settings(&env, &EN).unwrap(), json!({"model_size": "tiny"}));

        let env = decode(r#"{"total_cost_usd":0.12}"#);
        assert_eq!(analytics(&env, &EN).unwrap(), json!({"total_cost_usd": 0.12}));

        let env = decode(r#"{"ok":true,"data":{}}"#);
        assert_eq!(session_detail(&env, &EN).unwrap(), json!({}));
    }

    #[test]
    fn enveloped_reply_accepts_top_level_payload() {
        let env = decode(r#"{"ok":true,"sessions":[{"id":7}]}"#);
        assert_eq!(sessions(&env, &EN).unwrap()[0].id, Some(SessionId(7)));

        let env = decode(r#"{"ok":true,"settings":{"x":1}}"#);
        assert_eq!(settings(&env, &EN).unwrap(), json!({"x": 1}));

        let env = decode(r#"{"ok":true,"streaming_transcript":{"partial":"","finals":["hi"]}}"#);
        assert_eq!(streaming_transcript(&env).unwrap().render(), "hi");
    }

    #[test]
    fn enveloped_reply_is_never_its_own_payload() {
        // The envelope itself is not a settings document.
        let env = decode(r#"{"ok":true,"model_size":"small"}"#);
        assert_eq!(settings(&env, &EN).unwrap(), json!({}));
    }

    #[test]
    fn streaming_snapshot_shapes() {
        let env = decode(r#"{"ok":true,"data":{"streaming_transcript":{"partial":"th","finals":["hello"]}}}"#);
        assert_eq!(streaming_transcript(&env).unwrap().render(), "hello th");

        let env = decode(r#"{"partial":"","finals":["a","b"]}"#);
        assert_eq!(streaming_transcript(&env).unwrap().render(), "a b");

        let env = decode(r#"{"ok":true,"data":{}}"#);
        assert_eq!(streaming_transcript(&env).unwrap().render(), "—");

        assert!(streaming_transcript(&decode(r#"{"ok":false,"error":{}}"#)).is_none());
        assert!(streaming_transcript(&decode("garbage")).is_none());
    }

    #[test]
    fn analysis_text_requires_success() {
        let env = decode(r#"{"ok":true,"data":{"text":"Summary"}}"#);
        assert_eq!(analysis_text(&env), Some("Summary"));
        assert_eq!(analysis_text(&decode(r#"{"ok":true,"data":{"text":"  "}}"#)), None);
        assert_eq!(analysis_text(&decode(r#"{"text":"legacy"}"#)), None);
    }

    #[test]
    fn export_path_shapes() {
        let env = decode(r#"{"ok":true,"data":{"export":{"path":"/tmp/s1.md","format":"md"}}}"#);
        assert_eq!(export_path(&env, &EN), Ok(Some("/tmp/s1.md".to_string())));

        let env = decode(r#"{"ok":true,"data":{"export":{"path":""}}}"#);
        assert_eq!(export_path(&env, &EN), Ok(None));

        let env = decode(r#"{"ok":false,"error":{"message":"pandoc not found"}}"#);
        assert_eq!(export_path(&env, &EN), Err("pandoc not found".to_string()));
    }

    #[test]
    fn capabilities_from_bare_reply() {
        let env = decode(r#"{"api_version":"1.0","features":{"envelope_v1":false}}"#);
        let caps = capabilities(&env).unwrap();
        assert_eq!(caps.api_version.as_deref(), Some("1.0"));
        assert!(!caps.envelope_v1());
    }
}
