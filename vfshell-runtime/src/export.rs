use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use tokio::process::Command;
use vfshell_core::types::{ExportFormat, SessionId};
use vfshell_engine::traits::SessionExporter;

/// Exports sessions through the daemon's command-line front end:
/// `<program> export --id <N> --format <md|pdf>`.
///
/// The daemon has no export method on the bus, so the program's outcome is
/// wrapped in the same envelope the daemon uses: the trimmed stdout becomes
/// `data.export.path`, a non-zero exit becomes an `EXPORT_FAILED` error.
#[derive(Debug, Clone)]
pub struct CliExporter {
    program: String,
}

impl CliExporter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl SessionExporter for CliExporter {
    async fn export(&self, id: SessionId, format: ExportFormat) -> anyhow::Result<String> {
        log::info!("exporting session {id} as {format} via {}", self.program);

        let output = Command::new(&self.program)
            .args(["export", "--id", &id.to_string(), "--format", format.as_str()])
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("run {}", self.program))?;

        let envelope = if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            json!({
                "ok": true,
                "data": { "export": { "path": path, "format": format.as_str() } },
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr
            };
            json!({
                "ok": false,
                "error": { "code": "EXPORT_FAILED", "message": message },
            })
        };
        Ok(envelope.to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use vfshell_core::envelope::Envelope;
    use vfshell_core::messages::EN;
    use vfshell_core::payload;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-voiceforge");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn stdout_becomes_export_path() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), r#"echo "/tmp/session-$3.$5""#);
        let exporter = CliExporter::new(program.to_string_lossy());

        let raw = exporter.export(SessionId(12), ExportFormat::Pdf).await.unwrap();
        let env = Envelope::decode_text(&raw);
        assert_eq!(
            payload::export_path(&env, &EN),
            Ok(Some("/tmp/session-12.pdf".to_string()))
        );
    }

    #[tokio::test]
    async fn non_zero_exit_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), "echo 'session 3 not found' >&2\nexit 2");
        let exporter = CliExporter::new(program.to_string_lossy());

        let raw = exporter.export(SessionId(3), ExportFormat::Md).await.unwrap();
        let env = Envelope::decode_text(&raw);
        assert!(!env.ok);
        assert_eq!(env.error_message(&EN), "session 3 not found");
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let exporter = CliExporter::new("/nonexistent/voiceforge-shell-test");
        assert!(exporter.export(SessionId(1), ExportFormat::Md).await.is_err());
    }
}
