use std::io::Write;

use metrics::counter;
use tracing::{error, info};

use crate::config::Config;
use crate::consume_loop::ConsumeLoop;
use crate::eof::EofTracker;
use crate::error::ConsumeError;
use crate::formatter::MessageFormatter;
use crate::metadata::resolve_partitions;
use crate::metrics_consts::FATAL_ERROR_COUNTER;
use crate::orchestrator::ConsumptionOrchestrator;
use crate::run_state::{RunState, Stats, StopReason};
use crate::source::{PartitionSource, RecordQueue};

/// Consume `config.topic` into `sink` until the run is stopped.
///
/// Streams are opened only after metadata validation succeeds, and every
/// opened stream is closed again whichever way the run ends.
pub fn run<S, W>(
    config: &Config,
    source: &mut S,
    sink: W,
    run_state: &RunState,
) -> Result<Stats, ConsumeError>
where
    S: PartitionSource + RecordQueue,
    W: Write,
{
    let result = consume(config, source, sink, run_state);
    if let Err(e) = &result {
        run_state.stop(StopReason::Fatal);
        counter!(FATAL_ERROR_COUNTER, "error_type" => e.error_type()).increment(1);
    }
    result
}

fn consume<S, W>(
    config: &Config,
    source: &mut S,
    sink: W,
    run_state: &RunState,
) -> Result<Stats, ConsumeError>
where
    S: PartitionSource + RecordQueue,
    W: Write,
{
    let partitions = resolve_partitions(
        &*source,
        &config.topic,
        config.partition,
        config.metadata_timeout,
    )?;

    let tracker = EofTracker::new(&partitions, config.partition, config.exit_on_eof);
    let formatter = MessageFormatter::new(sink, config.format).unbuffered(config.unbuffered);

    let mut orchestrator = ConsumptionOrchestrator::new(config.topic.as_str());
    orchestrator.start(source, &partitions, config.offset, config.partition)?;

    let mut consume_loop = ConsumeLoop::new(&config.topic, tracker, formatter, run_state)
        .message_limit(config.message_limit)
        .poll_timeout(config.poll_timeout);
    let result = consume_loop.run(source);

    orchestrator.stop(source);

    let mut formatter = consume_loop.into_formatter();
    let stats = result?;
    formatter.flush().map_err(ConsumeError::Flush)?;

    info!("consumed {} message(s) from {}", stats.rx, config.topic);
    Ok(stats)
}

/// Process exit code for a finished run.
pub fn exit_code(result: &Result<Stats, ConsumeError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(e) => {
            error!("{}", e);
            1
        }
    }
}
