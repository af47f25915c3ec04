//! Example exporter.
//!
//! Without `--config` it serves three demo metrics on `:2112/metrics`: a
//! gauge set every 3s to the average of the random samples taken since the
//! previous update, a counter incremented every 5s, and a counter increased
//! by 3 every 10s. With `--config` the metrics come from the file instead;
//! configured producers can refer to `average` and `random`.

mod samples;

use anyhow::{Context, Result};
use clap::Parser;
use monitoring_config::{Config, ConfigLoader, Validator};
use monitoring_observability::{init_tracing, LogFormat};
use monitoring_sdk::{
    Client, CounterOperation, MetricDescriptor, MetricsConfig, MetricsServer, Operation, Producer,
    ProducerCatalog,
};
use samples::SampleStats;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "monitoring-demo")]
#[command(version, about = "Serve periodically updated metrics on a Prometheus scrape endpoint")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bind address for the scrape endpoint
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Port for the scrape endpoint
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// File (or defaults), then `MONITORING_*` variables, then flags
async fn load_config(cli: &Cli) -> Result<Config> {
    let loader = ConfigLoader::new();
    let mut config = match &cli.config {
        Some(path) => loader
            .load_with_overrides(path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => {
            let mut config = Config::default();
            loader.apply_env_overrides(&mut config)?;
            config
        }
    };

    if let Some(bind) = &cli.bind {
        config.server.bind_address = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = Some(level.clone());
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn init_logging(config: &Config) -> Result<()> {
    let format: LogFormat = config.logging.format.parse()?;
    init_tracing(format, config.logging.level.as_deref())?;
    Ok(())
}

/// Metrics served when no configuration file declares any
fn demo_metrics(stats: &SampleStats) -> Vec<MetricDescriptor> {
    let stats = stats.clone();
    vec![
        MetricDescriptor::gauge(
            "gauge_metric_test",
            "this metric will always be changed on every 3 second",
            Operation::Set,
            Duration::from_secs(3),
        )
        .with_producer(Producer::new(move || stats.take_average())),
        MetricDescriptor::counter(
            "counter_metric_test",
            "this metric will always be incremented by 1 every 5 second",
            CounterOperation::Increment,
            Duration::from_secs(5),
        ),
        MetricDescriptor::counter(
            "counter_metric_test_add_by_3",
            "this metric will always be incremented by 3 every 10 second",
            CounterOperation::Add,
            Duration::from_secs(10),
        )
        .with_producer(Producer::constant(3.0)),
    ]
}

fn producer_catalog(stats: &SampleStats) -> ProducerCatalog {
    let stats = stats.clone();
    let mut catalog = ProducerCatalog::new();
    catalog
        .register("average", Producer::new(move || stats.take_average()))
        .register("random", Producer::new(samples::random_sample));
    catalog
}

async fn run(config: Config) -> Result<()> {
    let mut client = Client::from_name(&config.backend)?;
    let token = client.cancellation_token();

    let stats = SampleStats::new();
    samples::spawn(stats.clone(), Duration::from_secs(1), token.child_token());

    if config.metrics.is_empty() {
        client.init(demo_metrics(&stats))?;
    } else {
        client.init_from_config(&config, &producer_catalog(&stats))?;
    }

    for descriptor in client.descriptors() {
        info!(
            metric = descriptor.name(),
            kind = %descriptor.kind(),
            operation = %descriptor.operation(),
            interval = ?descriptor.interval(),
            "Serving metric"
        );
    }

    let served = if config.server.enabled {
        let server = MetricsServer::new(
            client.handler_at(&config.server.path)?,
            MetricsConfig::from(&config.server),
        );
        serve_until_interrupted(server, token.clone()).await
    } else {
        info!("Metrics server disabled, updating metrics until interrupted");
        tokio::signal::ctrl_c().await.map_err(anyhow::Error::from)
    };

    token.cancel();
    client.shutdown().await;
    served
}

/// Run `server` until it fails or Ctrl+C arrives
async fn serve_until_interrupted(server: MetricsServer, token: CancellationToken) -> Result<()> {
    let mut server_task = tokio::spawn(server.serve(token.clone()));

    tokio::select! {
        result = &mut server_task => {
            return result.context("metrics server task failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
        }
    }

    token.cancel();
    server_task.await.context("metrics server task failed")?
}
