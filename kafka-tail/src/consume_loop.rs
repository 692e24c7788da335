use std::io::Write;
use std::time::Duration;

use metrics::counter;
use tracing::info;

use crate::eof::{EofOutcome, EofTracker};
use crate::error::ConsumeError;
use crate::formatter::MessageFormatter;
use crate::metrics_consts::{
    PARTITION_EOF_COUNTER, RECORDS_EMITTED_COUNTER, STREAM_ERROR_COUNTER,
};
use crate::run_state::{RunState, Stats, StopReason};
use crate::source::RecordQueue;
use crate::types::ConsumedRecord;

/// Drains the shared queue until the run is stopped.
pub struct ConsumeLoop<'a, W: Write> {
    topic: &'a str,
    tracker: EofTracker,
    formatter: MessageFormatter<W>,
    run_state: &'a RunState,
    message_limit: Option<u64>,
    poll_timeout: Duration,
    stats: Stats,
}

impl<'a, W: Write> ConsumeLoop<'a, W> {
    pub fn new(
        topic: &'a str,
        tracker: EofTracker,
        formatter: MessageFormatter<W>,
        run_state: &'a RunState,
    ) -> Self {
        Self {
            topic,
            tracker,
            formatter,
            run_state,
            message_limit: None,
            poll_timeout: Duration::from_millis(100),
            stats: Stats::default(),
        }
    }

    /// Stop after this many records; zero means no limit.
    pub fn message_limit(mut self, limit: Option<u64>) -> Self {
        self.message_limit = limit.filter(|limit| *limit > 0);
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn tracker(&self) -> &EofTracker {
        &self.tracker
    }

    pub fn into_formatter(self) -> MessageFormatter<W> {
        self.formatter
    }

    /// Poll until stopped. The run state is checked before every dequeue and
    /// before every drained item, so nothing is processed after a stop.
    pub fn run<Q: RecordQueue>(&mut self, queue: &mut Q) -> Result<Stats, ConsumeError> {
        while self.run_state.is_running() {
            let batch = queue.dequeue(self.poll_timeout).map_err(|e| {
                self.fail(ConsumeError::Stream {
                    topic: self.topic.to_string(),
                    partition: None,
                    detail: e.to_string(),
                })
            })?;

            for record in batch {
                if !self.run_state.is_running() {
                    break;
                }
                self.dispatch(record)?;
            }
        }

        if let Some(reason) = self.run_state.stop_reason() {
            info!("stopped consuming {}: {}", self.topic, reason);
        }
        Ok(self.stats)
    }

    fn dispatch(&mut self, record: ConsumedRecord) -> Result<(), ConsumeError> {
        match record {
            ConsumedRecord::Data {
                partition,
                offset,
                key,
                payload,
            } => {
                self.formatter
                    .format(offset, &key, &payload)
                    .map_err(|e| self.fail(e))?;

                self.stats.rx += 1;
                counter!(RECORDS_EMITTED_COUNTER, "partition" => partition.to_string())
                    .increment(1);

                if self.message_limit == Some(self.stats.rx) {
                    self.run_state.stop(StopReason::MessageLimit);
                }
            }
            ConsumedRecord::PartitionEnd { partition, offset } => {
                counter!(PARTITION_EOF_COUNTER, "partition" => partition.to_string()).increment(1);

                if self.tracker.observe(self.topic, partition, offset)
                    == EofOutcome::ThresholdReached
                {
                    self.run_state.stop(StopReason::EndOfPartitions);
                }
            }
            ConsumedRecord::Error { partition, detail } => {
                counter!(STREAM_ERROR_COUNTER).increment(1);
                return Err(self.fail(ConsumeError::Stream {
                    topic: self.topic.to_string(),
                    partition,
                    detail,
                }));
            }
        }
        Ok(())
    }

    fn fail(&self, err: ConsumeError) -> ConsumeError {
        self.run_state.stop(StopReason::Fatal);
        err
    }
}
