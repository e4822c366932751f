use anyhow::{Context, Result};
use clap::Parser;
use deoptscope::cli::{Cli, OutputFormat};
use deoptscope::config::ReportConfig;
use deoptscope::function_entry::FunctionEntry;
use deoptscope::history::FunctionHistory;
use deoptscope::log::{load_snapshot, Log};
use deoptscope::report::LogReport;
use deoptscope::session::LogSession;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(args: &Cli) -> Result<ReportConfig> {
    let mut config = match &args.config {
        Some(path) => ReportConfig::from_toml(path)?,
        None => ReportConfig::default(),
    };
    if let Some(top) = args.top {
        config.top = top;
    }
    Ok(config)
}

/// Resolve the function named by `--history` or `--history-uri`
fn history_target<'a>(args: &Cli, session: &'a LogSession, log: &'a Log) -> Result<Option<&'a FunctionEntry>> {
    if let Some(position) = &args.history {
        let entry = log
            .find_function_entry_by_file_position(position)
            .with_context(|| format!("No function at {position}"))?;
        return Ok(Some(entry));
    }
    if let Some(uri) = &args.history_uri {
        let entry = session
            .find_function_entry_by_uri(uri)
            .with_context(|| format!("No function for history URI '{uri}'"))?;
        return Ok(Some(entry));
    }
    Ok(None)
}

fn print_history(log: &Log, entry: &FunctionEntry, format: OutputFormat) -> Result<()> {
    let history = FunctionHistory::new(log, entry)?;
    match format {
        OutputFormat::Text => print!("{}", history.to_text()?),
        OutputFormat::Html => print!("{}", history.to_html()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&history.rows()?)?),
    }
    Ok(())
}

fn print_report(log: &Log, config: &ReportConfig, format: OutputFormat) -> Result<()> {
    let report = LogReport::build(log, config);
    match format {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Html => {
            anyhow::bail!("HTML output is only available for a function history (use --history)")
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = load_config(&args)?;

    let mut session = LogSession::new();
    session.open(load_snapshot(&args.snapshot)?);
    let log = session
        .opened()
        .cloned()
        .context("No log opened")?;

    match history_target(&args, &session, &log)? {
        Some(entry) => print_history(&log, entry, args.format),
        None => print_report(&log, &config, args.format),
    }
}
