use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use simrun_abi::SIMRUN_RUN_ENTRY_SYMBOL;

use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "simrun.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokerConfig {
    /// Exported symbol invoked by `run_to_completion`.
    pub entry_symbol: String,
    /// Directories searched when a backend is given by logical name.
    pub search_dirs: Vec<PathBuf>,
    /// Register progress/message callbacks when the backend exports them.
    pub register_callbacks: bool,
    /// Loaded modules stay resident for the life of the process unless this is set.
    pub allow_unload: bool,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            entry_symbol: SIMRUN_RUN_ENTRY_SYMBOL.to_string(),
            search_dirs: Vec::new(),
            register_callbacks: true,
            allow_unload: false,
        }
    }
}

impl InvokerConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
        serde_json::from_str::<Self>(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `path` when it exists, defaults otherwise.
    pub fn read_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::read(path)
    }

    pub fn with_entry_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.entry_symbol = symbol.into();
        self
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: InvokerConfig = serde_json::from_str(r#"{"allow_unload":true}"#).unwrap();
        assert!(config.allow_unload);
        assert!(config.register_callbacks);
        assert_eq!(config.entry_symbol, SIMRUN_RUN_ENTRY_SYMBOL);
        assert!(config.search_dirs.is_empty());
    }

    #[test]
    fn read_or_default_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = InvokerConfig::read_or_default(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, InvokerConfig::default());
    }

    #[test]
    fn read_reports_path_on_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();
        match InvokerConfig::read(&path) {
            Err(Error::Config { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn read_parses_search_dirs_and_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{"entry_symbol":"run_fully","search_dirs":["/opt/energyplus"]}"#,
        )
        .unwrap();
        let config = InvokerConfig::read(&path).unwrap();
        assert_eq!(config.entry_symbol, "run_fully");
        assert_eq!(config.search_dirs, vec![PathBuf::from("/opt/energyplus")]);
        assert!(!config.allow_unload);
    }
}
