use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::Messages;
use crate::types::SessionSummary;

/// Shown while polling is active but nothing has been said yet.
pub const STREAMING_PLACEHOLDER: &str = "—";

/// Rendered in table cells with no value.
pub const MISSING_CELL: &str = "—";

/// Snapshot of the live transcript. The daemon owns ordering and finality;
/// each poll replaces the previous snapshot wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamingTranscript {
    pub finals: Vec<String>,
    pub partial: String,
}

impl StreamingTranscript {
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let partial = obj
            .get("partial")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let finals = obj
            .get("finals")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|f| match f {
                        Value::String(s) => s.clone(),
                        other => other
                            .get("text")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(Self { finals, partial })
    }

    pub fn render(&self) -> String {
        let text = self
            .finals
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.partial.as_str()))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if text.is_empty() {
            STREAMING_PLACEHOLDER.to_string()
        } else {
            text
        }
    }
}

pub fn format_duration(duration_sec: Option<f64>, messages: &Messages) -> String {
    match duration_sec {
        Some(d) if d.fract() == 0.0 => format!("{}{}", d as i64, messages.seconds_suffix),
        Some(d) => format!("{:.1}{}", d, messages.seconds_suffix),
        None => MISSING_CELL.to_string(),
    }
}

/// Plain-text table of sessions (id, start, duration).
pub fn render_sessions_table(sessions: &[SessionSummary], messages: &Messages) -> String {
    let rows: Vec<[String; 3]> = sessions
        .iter()
        .map(|s| {
            [
                s.id.map(|id| id.to_string())
                    .unwrap_or_else(|| MISSING_CELL.to_string()),
                s.started_at
                    .clone()
                    .unwrap_or_else(|| MISSING_CELL.to_string()),
                format_duration(s.duration_sec, messages),
            ]
        })
        .collect();

    let header = [
        messages.column_id.to_string(),
        messages.column_started.to_string(),
        messages.column_duration.to_string(),
    ];

    let mut widths = header.clone().map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String; 3]| {
        cells
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(&header)];
    out.extend(rows.iter().map(line));
    out.join("\n")
}

/// Opaque payloads are shown verbatim, pretty-printed.
pub fn render_document(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{EN, RU};
    use crate::types::SessionId;
    use serde_json::json;

    #[test]
    fn merges_finals_then_partial() {
        let t = StreamingTranscript {
            finals: vec!["hello".into(), "world".into()],
            partial: "th".into(),
        };
        assert_eq!(t.render(), "hello world th");
    }

    #[test]
    fn empty_snapshot_renders_placeholder() {
        assert_eq!(StreamingTranscript::default().render(), "—");
    }

    #[test]
    fn partial_only_has_no_leading_space() {
        let t = StreamingTranscript {
            finals: vec![],
            partial: "th".into(),
        };
        assert_eq!(t.render(), "th");
    }

    #[test]
    fn finals_may_be_objects_with_text() {
        let t = StreamingTranscript::from_value(&json!({
            "partial": "",
            "finals": ["a", {"text": "b", "speaker": "S1"}, {"other": 1}]
        }))
        .unwrap();
        assert_eq!(t.finals, vec!["a", "b", ""]);
        assert_eq!(t.render(), "a b");
    }

    #[test]
    fn sessions_table_layout() {
        let sessions = vec![
            SessionSummary {
                id: Some(SessionId(7)),
                started_at: Some("2024-05-01 10:00".into()),
                duration_sec: Some(95.0),
                segments_count: None,
            },
            SessionSummary::default(),
        ];
        let table = render_sessions_table(&sessions, &EN);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].contains("2024-05-01 10:00"));
        assert!(lines[1].ends_with("95 s"));
        assert!(lines[2].starts_with("—"));
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(Some(12.34), &RU), "12.3 с");
        assert_eq!(format_duration(None, &EN), "—");
    }
}
