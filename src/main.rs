use anyhow::{Context, Result};
use clap::Parser;
use readwell::{Config, ExtractionResult, Pipeline};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract readable article text from web pages", long_about = None)]
struct Args {
    /// Article URLs to extract
    #[arg(required = true)]
    urls: Vec<String>,

    /// Maximum number of extractions in flight
    #[arg(short, long, default_value_t = 4)]
    concurrency: usize,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let config = Config::from_env().context("invalid configuration")?;
    let pipeline = Arc::new(Pipeline::new(config).context("failed to build pipeline")?);

    let shutdown = CancellationToken::new();
    let sweeper = pipeline.spawn_policy_sweeper(SWEEP_INTERVAL, shutdown.clone());

    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Received shutdown signal, cancelling extractions...");
        ctrl_c_token.cancel();
    });

    let permits = Arc::new(Semaphore::new(args.concurrency.max(1)));
    let mut tasks = JoinSet::new();
    for (index, url) in args.urls.into_iter().enumerate() {
        let pipeline = pipeline.clone();
        let permits = permits.clone();
        let cancel = shutdown.clone();
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let outcome = pipeline.extract_with_cancel(&url, &cancel).await;
            (index, url, outcome)
        });
    }

    let mut results: Vec<(usize, ExtractionResult)> = Vec::new();
    let mut invalid = 0usize;
    while let Some(joined) = tasks.join_next().await {
        let (index, url, outcome) = joined.context("extraction task panicked")?;
        match outcome {
            Ok(result) => results.push((index, result)),
            Err(e) => {
                warn!(%url, error = %e, "skipping input");
                invalid += 1;
            }
        }
    }
    results.sort_by_key(|(index, _)| *index);
    let results: Vec<ExtractionResult> = results.into_iter().map(|(_, r)| r).collect();

    let output = if args.pretty {
        serde_json::to_string_pretty(&results)?
    } else {
        serde_json::to_string(&results)?
    };
    println!("{}", output);

    shutdown.cancel();
    sweeper.await.context("policy sweeper panicked")?;

    if invalid > 0 {
        anyhow::bail!("{} input(s) were not valid article URLs", invalid);
    }
    Ok(())
}
