//! CLI argument parsing for Deoptscope

use crate::position::FilePosition;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for reports and histories
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// HTML page (function history only)
    Html,
}

#[derive(Parser, Debug)]
#[command(name = "deoptscope")]
#[command(version)]
#[command(about = "Rank functions and inline caches from a V8 optimization trace", long_about = None)]
pub struct Cli {
    /// JSON log snapshot produced by the trace parser
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Report configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show the history of the function at FILE:LINE:COLUMN
    #[arg(long = "history", value_name = "POSITION", conflicts_with = "history_uri")]
    pub history: Option<FilePosition>,

    /// Show the history of the function named by a function-history URI
    #[arg(long = "history-uri", value_name = "URI")]
    pub history_uri: Option<String>,

    /// Maximum entries per report section (overrides config, 0 = unlimited)
    #[arg(short = 'n', long = "top", value_name = "N")]
    pub top: Option<usize>,

    /// Enable debug tracing to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_snapshot() {
        let cli = Cli::parse_from(["deoptscope", "trace.json"]);
        assert_eq!(cli.snapshot, PathBuf::from("trace.json"));
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.history.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_parses_history_position() {
        let cli = Cli::parse_from(["deoptscope", "trace.json", "--history", "/src/app.js:3:5"]);
        assert_eq!(cli.history, Some(FilePosition::new("/src/app.js", 2, 4)));
    }

    #[test]
    fn test_cli_rejects_bad_position() {
        assert!(Cli::try_parse_from(["deoptscope", "trace.json", "--history", "app.js"]).is_err());
    }

    #[test]
    fn test_cli_history_conflicts_with_uri() {
        let result = Cli::try_parse_from([
            "deoptscope",
            "trace.json",
            "--history",
            "/a.js:1:1",
            "--history-uri",
            "deoptscope-function-history:x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_format_and_top() {
        let cli = Cli::parse_from(["deoptscope", "t.json", "--format", "json", "-n", "5", "--debug"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.top, Some(5));
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_requires_snapshot() {
        assert!(Cli::try_parse_from(["deoptscope"]).is_err());
    }
}
