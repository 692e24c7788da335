use std::io;

use rdkafka::error::KafkaError;
use thiserror::Error;

use crate::types::PartitionId;

/// Bad user input, surfaced before any consumption starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid offset {0:?}: expected end, beginning, stored or an integer")]
    InvalidOffsetSpec(String),
    #[error("invalid delimiter {0:?}: expected a single byte or an escape sequence")]
    InvalidDelimiter(String),
    #[error("expected -X property=value or -X dump, not {0:?}")]
    InvalidProperty(String),
    #[error("topic {topic} (with partitions 0..{max}): partition {partition} does not exist")]
    UnknownPartition {
        topic: String,
        partition: PartitionId,
        max: i64,
    },
}

/// Topic or partition layout could not be established.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("failed to query metadata for topic {topic}: {source}")]
    Fetch {
        topic: String,
        #[source]
        source: SourceError,
    },
    #[error("no such topic in cluster: {0}")]
    TopicNotFound(String),
    #[error("topic {topic} error: {detail}")]
    TopicError { topic: String, detail: String },
    #[error("topic {0} has no partitions")]
    NoPartitions(String),
    #[error("topic {topic} (with partitions 0..{max}): partition {partition} does not exist")]
    PartitionNotFound {
        topic: String,
        partition: PartitionId,
        max: i64,
    },
    #[error("topic {topic} [{partition}] error: {detail}")]
    PartitionError {
        topic: String,
        partition: PartitionId,
        detail: String,
    },
}

/// Failure reported by the client library behind a `PartitionSource` or `RecordQueue`.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("kafka error: {0}")]
    Kafka(#[from] KafkaError),
    #[error("{0}")]
    Unavailable(String),
}

/// Any condition that ends a run with a non-zero exit code.
#[derive(Error, Debug)]
pub enum ConsumeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("failed to start consuming topic {topic} [{partition}]: {source}")]
    Open {
        topic: String,
        partition: PartitionId,
        #[source]
        source: SourceError,
    },
    #[error("topic {topic} [{part}] error: {detail}", part = display_partition(.partition))]
    Stream {
        topic: String,
        partition: Option<PartitionId>,
        detail: String,
    },
    #[error("write error for message of {len} bytes at offset {offset}: {source}")]
    Output {
        offset: i64,
        len: usize,
        #[source]
        source: io::Error,
    },
    #[error("failed to flush output: {0}")]
    Flush(#[source] io::Error),
}

impl ConsumeError {
    /// Tag used for logs and metrics labels.
    pub fn error_type(&self) -> &'static str {
        match self {
            ConsumeError::Config(_) => "config",
            ConsumeError::Metadata(_) => "metadata",
            ConsumeError::Open { .. } => "open",
            ConsumeError::Stream { .. } => "stream",
            ConsumeError::Output { .. } | ConsumeError::Flush(_) => "output",
        }
    }
}

fn display_partition(partition: &Option<PartitionId>) -> String {
    match partition {
        Some(partition) => partition.to_string(),
        None => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_error_names_the_partition_when_known() {
        let known = ConsumeError::Stream {
            topic: "events".to_string(),
            partition: Some(3),
            detail: "broker transport failure".to_string(),
        };
        assert_eq!(
            known.to_string(),
            "topic events [3] error: broker transport failure"
        );

        let unknown = ConsumeError::Stream {
            topic: "events".to_string(),
            partition: None,
            detail: "broker transport failure".to_string(),
        };
        assert_eq!(
            unknown.to_string(),
            "topic events [?] error: broker transport failure"
        );
    }

    #[test]
    fn partition_not_found_reports_the_valid_range() {
        let err = MetadataError::PartitionNotFound {
            topic: "events".to_string(),
            partition: 7,
            max: 2,
        };
        assert_eq!(
            err.to_string(),
            "topic events (with partitions 0..2): partition 7 does not exist"
        );
    }
}
