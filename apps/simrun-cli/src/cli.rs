use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser, Clone)]
#[command(name = "simrun")]
#[command(about = "Load a native simulation backend and run it to completion")]
pub struct Cli {
    /// Backend library path, or a logical name searched in `--search-dir`.
    pub backend: PathBuf,

    /// Path handed to the backend. Defaults to the backend path itself.
    pub input: Option<PathBuf>,

    /// Exported entry point to invoke.
    #[arg(long)]
    pub entry_symbol: Option<String>,

    /// Extra directory to search for logically named backends (repeatable).
    #[arg(long = "search-dir")]
    pub search_dirs: Vec<PathBuf>,

    /// Invoker config file. Defaults to `simrun.json` in the user config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Do not register progress/message callbacks even if the backend exports them.
    #[arg(long)]
    pub no_callbacks: bool,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn input_path(&self) -> &PathBuf {
        self.input.as_ref().unwrap_or(&self.backend)
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn input_defaults_to_backend_path() {
        let cli = Cli::parse_from(["simrun", "/tmp/epdll"]);
        assert_eq!(cli.input_path(), &PathBuf::from("/tmp/epdll"));
        assert!(cli.search_dirs.is_empty());
        assert!(!cli.no_callbacks);
    }

    #[test]
    fn repeated_search_dirs_accumulate() {
        let cli = Cli::parse_from([
            "simrun",
            "energyplusapi",
            "in.idf",
            "--search-dir",
            "/opt/a",
            "--search-dir",
            "/opt/b",
            "--entry-symbol",
            "run_fully",
        ]);
        assert_eq!(cli.input_path(), &PathBuf::from("in.idf"));
        assert_eq!(
            cli.search_dirs,
            vec![PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]
        );
        assert_eq!(cli.entry_symbol.as_deref(), Some("run_fully"));
    }
}
