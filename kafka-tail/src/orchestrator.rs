use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConsumeError};
use crate::offset::OffsetDirective;
use crate::source::PartitionSource;
use crate::types::{PartitionId, PartitionSet};

/// Opens the wanted partition streams into the shared queue and guarantees
/// they all get closed again.
#[derive(Debug)]
pub struct ConsumptionOrchestrator {
    topic: String,
    opened: Vec<PartitionId>,
}

impl ConsumptionOrchestrator {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            opened: Vec::new(),
        }
    }

    pub fn opened(&self) -> &[PartitionId] {
        &self.opened
    }

    /// Open one stream per selected partition, all starting at `offset`.
    ///
    /// Coverage is all or nothing: if any partition fails to open, the ones
    /// already opened are closed and the error is returned.
    pub fn start<S: PartitionSource>(
        &mut self,
        source: &mut S,
        partitions: &PartitionSet,
        offset: OffsetDirective,
        selection: Option<PartitionId>,
    ) -> Result<(), ConsumeError> {
        let mut found = selection.is_none();

        for partition in partitions.iter() {
            if selection.is_some_and(|wanted| wanted != partition) {
                continue;
            }

            if let Err(source_err) = source.open_partition_stream(&self.topic, partition, offset) {
                self.stop(source);
                return Err(ConsumeError::Open {
                    topic: self.topic.clone(),
                    partition,
                    source: source_err,
                });
            }
            debug!(
                "started consuming {} [{}] from {}",
                self.topic, partition, offset
            );
            self.opened.push(partition);

            if selection.is_some() {
                found = true;
                break;
            }
        }

        if !found {
            self.stop(source);
            return Err(ConfigError::UnknownPartition {
                topic: self.topic.clone(),
                partition: selection.unwrap_or_default(),
                max: partitions.max_id(),
            }
            .into());
        }

        info!(
            "consuming {} partition(s) of {} from {}",
            self.opened.len(),
            self.topic,
            offset
        );
        Ok(())
    }

    /// Close every opened stream, last opened first, then release the queue.
    /// Close failures are logged; they must not hide how the run ended.
    pub fn stop<S: PartitionSource>(&mut self, source: &mut S) {
        while let Some(partition) = self.opened.pop() {
            if let Err(e) = source.close_partition_stream(&self.topic, partition) {
                warn!(
                    "failed to stop consuming {} [{}]: {}",
                    self.topic, partition, e
                );
            }
        }

        if let Err(e) = source.release_queue() {
            warn!("failed to release shared queue for {}: {}", self.topic, e);
        }
    }
}
