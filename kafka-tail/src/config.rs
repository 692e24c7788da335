use std::time::Duration;

use envconfig::Envconfig;

use crate::error::ConfigError;
use crate::formatter::FormatOptions;
use crate::offset::OffsetDirective;
use crate::types::PartitionId;

/// Client-level settings, shared by every invocation on a host.
#[derive(Envconfig, Debug, Clone)]
pub struct KafkaConfig {
    #[envconfig(default = "localhost:9092")]
    pub kafka_hosts: String,

    #[envconfig(default = "false")]
    pub kafka_tls: bool,

    // Only used for committed offsets, partitions are always assigned manually
    #[envconfig(default = "kafka-tail")]
    pub kafka_consumer_group: String,

    #[envconfig(default = "5000")]
    pub kafka_metadata_timeout_ms: u64,

    #[envconfig(default = "100")]
    pub kafka_poll_timeout_ms: u64,

    #[envconfig(default = "100")]
    pub kafka_poll_batch_size: usize, // Max records drained per dequeue
}

impl KafkaConfig {
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.kafka_metadata_timeout_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.kafka_poll_timeout_ms)
    }
}

/// Everything a single run needs, fixed once arguments are parsed.
#[derive(Debug, Clone)]
pub struct Config {
    pub topic: String,
    pub partition: Option<PartitionId>,
    pub offset: OffsetDirective,
    pub format: FormatOptions,
    pub message_limit: Option<u64>,
    pub exit_on_eof: bool,
    pub unbuffered: bool,
    pub verbosity: u8,
    pub metadata_timeout: Duration,
    pub poll_timeout: Duration,
}

impl Config {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            partition: None,
            offset: OffsetDirective::Earliest,
            format: FormatOptions::default(),
            message_limit: None,
            exit_on_eof: false,
            unbuffered: false,
            verbosity: 1,
            metadata_timeout: Duration::from_secs(5),
            poll_timeout: Duration::from_millis(100),
        }
    }
}

/// Parse a delimiter argument: a single byte, or one of `\n \t \r \0 \\`.
pub fn parse_delimiter(s: &str) -> Result<u8, ConfigError> {
    match s.as_bytes() {
        [byte] => Ok(*byte),
        [b'\\', escape] => match escape {
            b'n' => Ok(b'\n'),
            b't' => Ok(b'\t'),
            b'r' => Ok(b'\r'),
            b'0' => Ok(b'\0'),
            b'\\' => Ok(b'\\'),
            _ => Err(ConfigError::InvalidDelimiter(s.to_string())),
        },
        _ => Err(ConfigError::InvalidDelimiter(s.to_string())),
    }
}

/// A `-X` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyArg {
    /// `name=value`, passed to the client as is.
    Set(String, String),
    /// Print the resolved client configuration and exit.
    Dump,
}

pub fn parse_property(s: &str) -> Result<PropertyArg, ConfigError> {
    if s == "dump" {
        return Ok(PropertyArg::Dump);
    }
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => {
            Ok(PropertyArg::Set(name.to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidProperty(s.to_string())),
    }
}
