use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use simrun_host::{CONFIG_FILE_NAME, InvokerConfig};

use crate::cli::Cli;

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "simrun", "simrun")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// File config (explicit `--config`, else the user default if present) with flags on top.
pub fn resolve_config(cli: &Cli) -> Result<InvokerConfig> {
    let mut config = match cli.config.as_ref() {
        Some(path) => InvokerConfig::read(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => match default_config_path() {
            Some(path) => InvokerConfig::read_or_default(&path)
                .with_context(|| format!("load config {}", path.display()))?,
            None => InvokerConfig::default(),
        },
    };

    if let Some(symbol) = cli.entry_symbol.as_ref() {
        config.entry_symbol = symbol.clone();
    }
    config.search_dirs.extend(cli.search_dirs.iter().cloned());
    if cli.no_callbacks {
        config.register_callbacks = false;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use clap::Parser;

    use super::*;

    #[test]
    fn flags_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{"entry_symbol":"from_file","search_dirs":["/opt/file"],"register_callbacks":true}"#,
        )
        .unwrap();

        let cli = Cli::parse_from([
            OsString::from("simrun"),
            OsString::from("/tmp/epdll"),
            OsString::from("--config"),
            path.clone().into_os_string(),
            OsString::from("--entry-symbol"),
            OsString::from("from_flag"),
            OsString::from("--search-dir"),
            OsString::from("/opt/flag"),
            OsString::from("--no-callbacks"),
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.entry_symbol, "from_flag");
        assert_eq!(
            config.search_dirs,
            vec![PathBuf::from("/opt/file"), PathBuf::from("/opt/flag")]
        );
        assert!(!config.register_callbacks);
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        let cli = Cli::parse_from([
            OsString::from("simrun"),
            OsString::from("/tmp/epdll"),
            OsString::from("--config"),
            missing.into_os_string(),
        ]);
        let err = resolve_config(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("absent.json"));
    }
}
