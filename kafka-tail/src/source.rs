//! Seams to the Kafka client library.
//!
//! The core never talks to rdkafka directly: partition discovery and stream
//! lifecycle go through `PartitionSource`, draining goes through `RecordQueue`.
//! `KafkaSource` implements both against a broker, `test_utils::FakeSource`
//! in memory.

use std::time::Duration;

use crate::error::SourceError;
use crate::offset::OffsetDirective;
use crate::types::{ConsumedRecord, PartitionId, TopicMetadata};

pub trait PartitionSource {
    fn fetch_topic_metadata(
        &self,
        topic: &str,
        timeout: Duration,
    ) -> Result<TopicMetadata, SourceError>;

    /// Start delivering `partition` into the shared queue from `offset`.
    fn open_partition_stream(
        &mut self,
        topic: &str,
        partition: PartitionId,
        offset: OffsetDirective,
    ) -> Result<(), SourceError>;

    fn close_partition_stream(
        &mut self,
        topic: &str,
        partition: PartitionId,
    ) -> Result<(), SourceError>;

    /// Drop the shared queue once every stream is closed.
    fn release_queue(&mut self) -> Result<(), SourceError>;
}

pub trait RecordQueue {
    /// Wait up to `max_wait` for records; an empty result is not an error.
    fn dequeue(&mut self, max_wait: Duration) -> Result<Vec<ConsumedRecord>, SourceError>;
}
