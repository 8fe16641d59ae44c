//! Single-invocation host over a RocksDB ledger
//!
//! ```text
//! trade-host init T0 Bank Fund 0 Open
//! trade-host createTrade T1 Alice Bob 100 Pending
//! trade-host createCar T2 Carol Dan 40 Pending
//! trade-host query T1
//! ```

use anyhow::Context;
use std::io::Write;
use std::process::ExitCode;
use trade_ledger::{Config, Dispatcher, Metrics, RocksLedger, TradeStore};

fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut argv = std::env::args().skip(1);
    let Some(operation) = argv.next() else {
        eprintln!("usage: trade-host <operation> [args...]");
        return Ok(ExitCode::from(2));
    };
    let args: Vec<String> = argv.collect();

    let config = match std::env::var("TRADE_LEDGER_CONFIG") {
        Ok(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => Config::from_env()?,
    };

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        data_dir = %config.data_dir.display(),
        "Starting trade host"
    );

    let ledger = RocksLedger::open(&config).context("opening ledger")?;
    let store = TradeStore::from_config(ledger, &config)?;
    let dispatcher = Dispatcher::new(store).with_metrics(
        Metrics::new().map_err(|e| anyhow::anyhow!("creating metrics: {}", e))?,
    );

    tracing::info!(operation = %operation, args = args.len(), "Invoking");

    let result = if operation == "init" {
        dispatcher.init(&args).map(|()| None)
    } else {
        dispatcher.invoke(&operation, &args)
    };

    let code = match result {
        Ok(payload) => {
            let mut stdout = std::io::stdout().lock();
            if let Some(bytes) = payload {
                stdout.write_all(&bytes)?;
                stdout.write_all(b"\n")?;
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            let mut stderr = std::io::stderr().lock();
            stderr.write_all(&err.to_payload())?;
            stderr.write_all(b"\n")?;
            ExitCode::FAILURE
        }
    };

    if let Some(metrics) = dispatcher.metrics() {
        let text = metrics
            .encode_text()
            .map_err(|e| anyhow::anyhow!("encoding metrics: {}", e))?;
        tracing::debug!(metrics = %text, "Invocation metrics");
    }

    Ok(code)
}
