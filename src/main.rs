//! Catchlight command-line tool
//!
//! Replays recorded page sessions through the capture pipeline and inspects
//! request headers the way the server-side parser sees them.

use std::{collections::BTreeMap, env::var, fs::read_to_string, path::PathBuf, sync::Arc};

use {
    anyhow::Result,
    clap::{Parser, Subcommand},
    serde::Deserialize,
    serde_json::to_string_pretty,
    tokio::sync::broadcast::error::RecvError,
    tracing::{info, warn},
    tracing_subscriber::EnvFilter,
};

use catchlight::{
    CaptureEvent, CaptureSettings, ParseOptions, Replayer, SettingsManager, Trace,
    bridge::TracingConsole,
    error::{ErrorReporter, ResultExt},
    headers::{header_map_from_pairs, parse_request_headers},
};

/// Log filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "info";

/// Runtime error capture tooling.
#[derive(Parser)]
#[command(name = "catchlight", version, about)]
struct Cli {
    /// Settings file, defaults to the XDG config path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a recorded page session and print the delivery report.
    Replay {
        /// Trace file (JSON).
        trace: PathBuf,
    },
    /// Parse a JSON object of request headers.
    Headers {
        /// Headers file (JSON object of name to value or list of values).
        file: PathBuf,

        /// Treat the route as partially prerendered.
        #[arg(long)]
        ppr: bool,
    },
}

/// A header sent once or repeated.
#[derive(Deserialize)]
#[serde(untagged)]
enum HeaderValues {
    One(String),
    Many(Vec<String>),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        ErrorReporter::error(&error, "catchlight");
        std::process::exit(1);
    }
}

/// Builds the log filter from `RUST_LOG`, falling back to `info`.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

async fn run(cli: Cli) -> Result<()> {
    let manager = match cli.config {
        Some(path) => SettingsManager::with_config_path(path),
        None => SettingsManager::new(),
    }
    .add_context("Failed to load settings")?;
    let settings = manager.get_settings().clone();

    let output = match cli.command {
        Command::Replay { trace } => replay(&settings, trace).await?,
        Command::Headers { file, ppr } => headers(&settings, file, ppr)?,
    };
    println!("{output}");
    Ok(())
}

async fn replay(settings: &CaptureSettings, path: PathBuf) -> Result<String> {
    let trace = Trace::from_path(&path).add_contextf(format!("Failed to load trace {path:?}"))?;
    let replayer = Replayer::new(settings, Arc::new(TracingConsole));

    let (feed, mut events) = replayer.state().subscribe_feed();
    let monitor = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(CaptureEvent::Error(error)) => {
                    info!(name = %error.name, hydration = error.is_hydration(), "{}", error.message);
                }
                Ok(CaptureEvent::Rejection(rejection)) => {
                    info!(name = %rejection.name, "Unhandled rejection: {}", rejection.message);
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Capture feed lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let report = replayer.run(trace).add_context("Replay failed")?;
    drop(feed);
    monitor.await?;

    Ok(to_string_pretty(&report)?)
}

fn headers(settings: &CaptureSettings, path: PathBuf, ppr: bool) -> Result<String> {
    let contents =
        read_to_string(&path).add_contextf(format!("Failed to read headers {path:?}"))?;
    let raw: BTreeMap<String, HeaderValues> =
        serde_json::from_str(&contents).add_context("Headers must be a JSON object")?;

    let pairs = raw.into_iter().flat_map(|(name, values)| {
        let values = match values {
            HeaderValues::One(value) => vec![value],
            HeaderValues::Many(values) => values,
        };
        values.into_iter().map(move |value| (name.clone(), value))
    });
    let header_map = header_map_from_pairs(pairs).add_context("Invalid headers")?;

    let mut options = ParseOptions::from(settings);
    options.is_route_ppr_enabled |= ppr;
    let parsed =
        parse_request_headers(&header_map, options).add_context("Failed to parse headers")?;

    Ok(to_string_pretty(&parsed)?)
}
