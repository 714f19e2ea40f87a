use thiserror::Error;

/// Rejections of user input that happen before any daemon command is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("format must be md or pdf, got {0:?}")]
    ExportFormat(String),

    #[error("seconds must be 1..={max}, got {got}")]
    AnalysisSeconds { got: u32, max: u32 },

    #[error("period must look like 7d or 30d, got {0:?}")]
    AnalyticsPeriod(String),
}
