//! signal-cli: run the signal pipeline over candles stored in a JSON file.
//!
//! Usage: `signal-cli <candles.json> [--symbol SYMBOL]... [--watch]`
//!
//! Without `--symbol`, every symbol found in the file is analyzed. `--watch`
//! re-reads the file and re-analyzes every `UPDATE_INTERVAL` seconds until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use analysis_core::{OrchestratorConfig, SignalConfig};
use analysis_orchestrator::{SignalOrchestrator, SymbolSnapshot};
use anyhow::{bail, Context, Result};
use tokio::time;

mod source;

use source::JsonFileBarSource;

const USAGE: &str = "usage: signal-cli <candles.json> [--symbol SYMBOL]... [--watch]";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let path = args
        .first()
        .filter(|a| !a.starts_with("--"))
        .context(USAGE)?;
    let watch = args.iter().any(|a| a == "--watch");
    let mut symbols: Vec<String> = args
        .windows(2)
        .filter(|w| w[0] == "--symbol")
        .map(|w| w[1].trim().to_uppercase())
        .collect();

    let signal_config = SignalConfig::from_env().context("invalid signal configuration")?;
    let mut orchestrator_config = OrchestratorConfig::from_env().context("invalid orchestrator configuration")?;

    let source = Arc::new(JsonFileBarSource::new(path));
    if symbols.is_empty() {
        symbols = source
            .symbols()
            .await
            .with_context(|| format!("failed to read candles from {}", path))?;
    }
    if symbols.is_empty() {
        bail!("{} contains no candles", path);
    }
    orchestrator_config.symbols = symbols.clone();

    tracing::info!(
        "Analyzing {} symbol(s) from {} with {:?} scoring (threshold {:.0})",
        symbols.len(),
        path,
        signal_config.scheme,
        signal_config.confidence_threshold
    );

    let interval_seconds = orchestrator_config.update_interval_seconds.max(1);
    let orchestrator = SignalOrchestrator::new(source, signal_config, orchestrator_config);

    if !watch {
        let snapshots = run_once(&orchestrator, &symbols).await;
        if snapshots.is_empty() {
            bail!("no symbol could be analyzed");
        }
        return Ok(());
    }

    tracing::info!("Watching {} every {}s, Ctrl-C to stop", path, interval_seconds);
    let mut interval = time::interval(Duration::from_secs(interval_seconds));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            _ = interval.tick() => {
                run_once(&orchestrator, &symbols).await;
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr so stdout stays valid JSON
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Analyze every symbol, print the successful snapshots and return them.
async fn run_once(orchestrator: &SignalOrchestrator, symbols: &[String]) -> Vec<SymbolSnapshot> {
    let mut snapshots = Vec::new();
    for (symbol, result) in symbols.iter().zip(orchestrator.refresh(symbols).await) {
        match result {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => tracing::error!("Analysis failed for {}: {}", symbol, e),
        }
    }

    match serde_json::to_string_pretty(&snapshots) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to serialize snapshots: {}", e),
    }
    snapshots
}
