use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::error::{KafkaError, KafkaResult, RDKafkaErrorCode};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::types::RDKafkaRespErr;
use rdkafka::{Offset, TopicPartitionList};
use tracing::{debug, info};

use crate::config::KafkaConfig;
use crate::error::SourceError;
use crate::offset::OffsetDirective;
use crate::source::{PartitionSource, RecordQueue};
use crate::types::{ConsumedRecord, PartitionId, PartitionMetadata, TopicMetadata};

/// rdkafka consumer in manual-assignment mode. Every opened partition feeds
/// the consumer's main queue, which is the shared queue drained by the loop.
pub struct KafkaSource {
    consumer: BaseConsumer,
    topic: String,
    batch_size: usize,
    // Next offset per partition, for reporting where EOF was hit
    next_offsets: HashMap<PartitionId, i64>,
}

/// Client properties for a run, by name. `overrides` are applied last;
/// rdkafka has a single property namespace so a `topic.` prefix is dropped.
pub fn client_properties(
    config: &KafkaConfig,
    offset: OffsetDirective,
    overrides: &[(String, String)],
) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    let mut set = |name: &str, value: String| {
        properties.insert(name.to_string(), value);
    };

    set("bootstrap.servers", config.kafka_hosts.clone());
    set("group.id", config.kafka_consumer_group.clone());
    set("enable.partition.eof", "true".to_string());
    set("enable.auto.commit", offset.is_stored().to_string());
    set("auto.offset.reset", "earliest".to_string());

    if config.kafka_tls {
        set("security.protocol", "ssl".to_string());
        set("enable.ssl.certificate.verification", "false".to_string());
    };

    for (name, value) in overrides {
        let name = name.strip_prefix("topic.").unwrap_or(name);
        set(name, value.clone());
    }

    properties
}

pub fn client_config(
    config: &KafkaConfig,
    offset: OffsetDirective,
    overrides: &[(String, String)],
) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    for (name, value) in client_properties(config, offset, overrides) {
        client_config.set(name, value);
    }
    client_config
}

/// Write `name = value` lines, as printed by `-X dump`.
pub fn dump_properties<W: Write>(
    properties: &BTreeMap<String, String>,
    mut out: W,
) -> io::Result<()> {
    for (name, value) in properties {
        writeln!(out, "{name} = {value}")?;
    }
    out.flush()
}

impl KafkaSource {
    pub fn new(
        config: &KafkaConfig,
        topic: &str,
        offset: OffsetDirective,
        overrides: &[(String, String)],
    ) -> Result<Self, KafkaError> {
        info!("connecting to Kafka brokers at {}...", config.kafka_hosts);

        let client_config = client_config(config, offset, overrides);
        debug!("rdkafka configuration: {:?}", client_config);
        let consumer: BaseConsumer = client_config.create()?;

        Ok(Self {
            consumer,
            topic: topic.to_string(),
            batch_size: config.kafka_poll_batch_size.max(1),
            next_offsets: HashMap::new(),
        })
    }

    fn eof_offset(&self, partition: PartitionId) -> Option<i64> {
        if let Some(offset) = self.next_offsets.get(&partition) {
            return Some(*offset);
        }
        let position = self.consumer.position().ok()?;
        match position.find_partition(&self.topic, partition)?.offset() {
            Offset::Offset(offset) => Some(offset),
            _ => None,
        }
    }

    fn convert(&self, result: KafkaResult<BorrowedMessage<'_>>) -> ConsumedRecord {
        match result {
            Ok(message) => ConsumedRecord::Data {
                partition: message.partition(),
                offset: message.offset(),
                key: message.key().map(<[u8]>::to_vec).unwrap_or_default(),
                payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            },
            Err(e) => error_record(e, |partition| self.eof_offset(partition)),
        }
    }

    fn track(&mut self, record: &ConsumedRecord) {
        if let ConsumedRecord::Data {
            partition, offset, ..
        } = record
        {
            self.next_offsets.insert(*partition, offset + 1);
        }
    }
}

impl PartitionSource for KafkaSource {
    fn fetch_topic_metadata(
        &self,
        topic: &str,
        timeout: Duration,
    ) -> Result<TopicMetadata, SourceError> {
        let metadata = self.consumer.fetch_metadata(Some(topic), timeout)?;

        let Some(found) = metadata.topics().iter().find(|t| t.name() == topic) else {
            return Ok(TopicMetadata::missing());
        };
        // Brokers answer for unknown topics with an entry carrying this code
        if found.error() == Some(RDKafkaRespErr::RD_KAFKA_RESP_ERR_UNKNOWN_TOPIC_OR_PART) {
            return Ok(TopicMetadata::missing());
        }

        Ok(TopicMetadata {
            exists: true,
            error: found.error().map(describe),
            partitions: found
                .partitions()
                .iter()
                .map(|p| PartitionMetadata {
                    id: p.id(),
                    error: p.error().map(describe),
                })
                .collect(),
        })
    }

    fn open_partition_stream(
        &mut self,
        topic: &str,
        partition: PartitionId,
        offset: OffsetDirective,
    ) -> Result<(), SourceError> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(topic, partition, offset.into())?;
        self.consumer.incremental_assign(&tpl)?;
        Ok(())
    }

    fn close_partition_stream(
        &mut self,
        topic: &str,
        partition: PartitionId,
    ) -> Result<(), SourceError> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition(topic, partition);
        self.consumer.incremental_unassign(&tpl)?;
        self.next_offsets.remove(&partition);
        Ok(())
    }

    fn release_queue(&mut self) -> Result<(), SourceError> {
        self.consumer.unassign()?;
        Ok(())
    }
}

/// Map a consume error onto the queue: EOF is a control record, anything else
/// is a stream error. rdkafka does not say which partition a consume error
/// came from.
fn error_record(
    err: KafkaError,
    eof_offset: impl FnOnce(PartitionId) -> Option<i64>,
) -> ConsumedRecord {
    match err {
        KafkaError::PartitionEOF(partition) => ConsumedRecord::PartitionEnd {
            partition,
            offset: eof_offset(partition),
        },
        err => ConsumedRecord::Error {
            partition: None,
            detail: err.to_string(),
        },
    }
}

fn describe(code: RDKafkaRespErr) -> String {
    RDKafkaErrorCode::from(code).to_string()
}

impl RecordQueue for KafkaSource {
    fn dequeue(&mut self, max_wait: Duration) -> Result<Vec<ConsumedRecord>, SourceError> {
        let mut records = Vec::new();

        let Some(first) = self.consumer.poll(max_wait) else {
            return Ok(records);
        };
        let record = self.convert(first);
        self.track(&record);
        records.push(record);

        // Drain whatever else is already queued without waiting
        while records.len() < self.batch_size {
            let Some(next) = self.consumer.poll(Duration::ZERO) else {
                break;
            };
            let record = self.convert(next);
            self.track(&record);
            records.push(record);
        }

        Ok(records)
    }
}
