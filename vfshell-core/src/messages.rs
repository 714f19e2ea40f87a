use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    pub fn messages(self) -> &'static Messages {
        match self {
            Locale::En => &EN,
            Locale::Ru => &RU,
        }
    }
}

/// User-facing strings for one locale.
#[derive(Debug)]
pub struct Messages {
    pub daemon_reachable: &'static str,
    pub daemon_unreachable: &'static str,
    pub start_daemon: &'static str,
    pub unexpected_reply: &'static str,
    pub generic_failure: &'static str,
    pub error_prefix: &'static str,
    pub daemon_placeholder: &'static str,
    pub no_sessions: &'static str,
    pub loading: &'static str,
    pub start_recording: &'static str,
    pub stop_recording: &'static str,
    pub recording_active: &'static str,
    pub analysis_running: &'static str,
    pub analysis_done: &'static str,
    pub export_done: &'static str,
    pub export_completed: &'static str,
    pub export_failed: &'static str,
    pub column_id: &'static str,
    pub column_started: &'static str,
    pub column_duration: &'static str,
    pub seconds_suffix: &'static str,
}

impl Messages {
    pub fn unexpected_reply(&self, reply: &str) -> String {
        format!("{}{}", self.unexpected_reply, reply)
    }

    pub fn error(&self, detail: impl std::fmt::Display) -> String {
        format!("{}{}", self.error_prefix, detail)
    }
}

pub static EN: Messages = Messages {
    daemon_reachable: "Daemon is available",
    daemon_unreachable: "Daemon is unavailable. Start it with: voiceforge daemon",
    start_daemon: "Start the daemon: voiceforge daemon",
    unexpected_reply: "Unexpected reply: ",
    generic_failure: "Error",
    error_prefix: "Error: ",
    daemon_placeholder: "Start the daemon.",
    no_sessions: "No sessions.",
    loading: "Loading…",
    start_recording: "Start recording",
    stop_recording: "Stop recording",
    recording_active: "Recording",
    analysis_running: "Analyzing…",
    analysis_done: "Done.",
    export_done: "Export: ",
    export_completed: "completed",
    export_failed: "Export failed: ",
    column_id: "ID",
    column_started: "Started",
    column_duration: "Duration",
    seconds_suffix: " s",
};

pub static RU: Messages = Messages {
    daemon_reachable: "Демон доступен",
    daemon_unreachable: "Демон недоступен. Запустите: voiceforge daemon",
    start_daemon: "Запустите демон: voiceforge daemon",
    unexpected_reply: "Неожиданный ответ: ",
    generic_failure: "Ошибка",
    error_prefix: "Ошибка: ",
    daemon_placeholder: "Запустите демон.",
    no_sessions: "Сессий нет.",
    loading: "Загрузка…",
    start_recording: "Старт записи",
    stop_recording: "Стоп записи",
    recording_active: "Запись идёт",
    analysis_running: "Анализ…",
    analysis_done: "Готово.",
    export_done: "Экспорт: ",
    export_completed: "выполнен",
    export_failed: "Ошибка экспорта: ",
    column_id: "ID",
    column_started: "Начало",
    column_duration: "Длительность",
    seconds_suffix: " с",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_selects_table() {
        assert_eq!(Locale::Ru.messages().no_sessions, "Сессий нет.");
        assert_eq!(Locale::default().messages().no_sessions, "No sessions.");
    }

    #[test]
    fn unexpected_reply_keeps_reply_verbatim() {
        assert_eq!(EN.unexpected_reply("PONG "), "Unexpected reply: PONG ");
    }
}
