use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use vfshell_core::config::ShellConfig;

/// Shell settings persisted as pretty JSON.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub const FILE_NAME: &'static str = "shell.json";

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/voiceforge/shell.json`, or `./shell.json` when the
    /// platform has no config directory.
    pub fn default_path() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join("voiceforge").join(Self::FILE_NAME),
            None => PathBuf::from(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(&self) -> anyhow::Result<ShellConfig> {
        if !self.path.exists() {
            log::info!(
                "no config at {}; using defaults",
                self.path.display()
            );
            return Ok(ShellConfig::default());
        }
        let bytes = fs::read(&self.path)
            .with_context(|| format!("read config: {}", self.path.display()))?;
        let cfg: ShellConfig = serde_json::from_slice(&bytes).context("decode config JSON")?;
        Ok(cfg)
    }

    /// Writes a sibling temp file and persists it over the config, so a
    /// failed write never leaves a truncated file behind.
    pub fn save(&self, cfg: &ShellConfig) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(cfg).context("encode config JSON")?;
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create config directory: {}", parent.display()))?;
                parent
            }
            None => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("create temp file in {}", dir.display()))?;
        tmp.write_all(&json).context("write config")?;
        tmp.persist(&self.path)
            .with_context(|| format!("replace config: {}", self.path.display()))?;
        log::debug!("config saved to {}", self.path.display());
        Ok(())
    }
}
