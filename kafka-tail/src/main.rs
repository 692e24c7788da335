//! Consume a Kafka topic and write its messages to stdout.
use std::io::{self, BufWriter};
use std::net::SocketAddr;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use envconfig::Envconfig;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal::unix::SignalKind;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kafka_tail::cli::Cli;
use kafka_tail::kafka::{client_properties, dump_properties};
use kafka_tail::runner::{exit_code, run};
use kafka_tail::{KafkaConfig, KafkaSource, RunState, StopReason};

async fn wait_for_shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    let mut sigterm = tokio::signal::unix::signal(SignalKind::terminate())
        .expect("failed to install SIGTERM handler");

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = sigterm.recv() => info!("received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries the consumed data, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(cli.log_level().into())
                .from_env_lossy(),
        )
        .init();

    match consume(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn consume(cli: Cli) -> anyhow::Result<u8> {
    let mut kafka_config = KafkaConfig::init_from_env().context("invalid Kafka configuration")?;
    cli.apply_overrides(&mut kafka_config);
    let config = cli.to_config(&kafka_config);
    let overrides = cli.overrides();

    if cli.dump_requested() {
        let properties = client_properties(&kafka_config, config.offset, &overrides);
        dump_properties(&properties, io::stdout().lock())
            .context("failed to dump client configuration")?;
        return Ok(0);
    }

    if let Some(port) = cli.metrics_port {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
            .context("failed to start metrics exporter")?;
        info!("metrics server listening on {}", metrics_addr);
    }

    let mut source = KafkaSource::new(&kafka_config, &config.topic, config.offset, &overrides)
        .context("failed to create Kafka consumer")?;

    let run_state = RunState::new();
    let signal_state = run_state.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        signal_state.stop(StopReason::Signal);
    });

    // rdkafka polling blocks, keep it off the async workers
    let code = tokio::task::spawn_blocking(move || {
        let stdout = io::stdout();
        let sink = BufWriter::new(stdout.lock());
        let result = run(&config, &mut source, sink, &run_state);
        exit_code(&result)
    })
    .await
    .context("consumer thread panicked")?;

    Ok(code)
}
