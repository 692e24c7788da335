use clap::{ArgAction, Parser};
use tracing::Level;

use crate::config::{parse_delimiter, parse_property, Config, KafkaConfig, PropertyArg};
use crate::formatter::FormatOptions;
use crate::offset::OffsetDirective;
use crate::types::PartitionId;

/// Consume a Kafka topic and write every message to stdout.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Topic to consume
    pub topic: String,

    /// Bootstrap broker list, overrides KAFKA_HOSTS
    #[arg(short, long)]
    pub brokers: Option<String>,

    /// Only consume this partition (default: all)
    #[arg(short, long)]
    pub partition: Option<PartitionId>,

    /// Record delimiter
    #[arg(short, long, default_value = "\\n", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Print keys, followed by this delimiter
    #[arg(short, long, value_parser = parse_delimiter)]
    pub key_delimiter: Option<u8>,

    /// Start offset: beginning, end, stored, <value> or -<value> from the end
    #[arg(short, long, default_value = "beginning", allow_hyphen_values = true)]
    pub offset: OffsetDirective,

    /// Exit after this many messages
    #[arg(short, long)]
    pub count: Option<u64>,

    /// Exit once every consumed partition reached its end
    #[arg(short, long)]
    pub exit: bool,

    /// Print each message offset, followed by the key delimiter
    #[arg(short = 'O', long)]
    pub print_offset: bool,

    /// Flush output after every message
    #[arg(short, long)]
    pub unbuffered: bool,

    /// Increase verbosity, may be repeated
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Kafka client property, may be repeated; `-X dump` prints the resulting
    /// client configuration and exits
    #[arg(
        short = 'X',
        long = "property",
        value_name = "NAME=VALUE",
        value_parser = parse_property
    )]
    pub properties: Vec<PropertyArg>,

    /// Serve Prometheus metrics on this port while consuming
    #[arg(long)]
    pub metrics_port: Option<u16>,
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }

    /// Default log level, `RUST_LOG` still takes precedence.
    pub fn log_level(&self) -> Level {
        match self.verbosity() {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    pub fn apply_overrides(&self, kafka: &mut KafkaConfig) {
        if let Some(brokers) = &self.brokers {
            kafka.kafka_hosts = brokers.clone();
        }
    }

    /// `-X name=value` pairs in command-line order.
    pub fn overrides(&self) -> Vec<(String, String)> {
        self.properties
            .iter()
            .filter_map(|property| match property {
                PropertyArg::Set(name, value) => Some((name.clone(), value.clone())),
                PropertyArg::Dump => None,
            })
            .collect()
    }

    pub fn dump_requested(&self) -> bool {
        self.properties.contains(&PropertyArg::Dump)
    }

    pub fn to_config(&self, kafka: &KafkaConfig) -> Config {
        Config {
            topic: self.topic.clone(),
            partition: self.partition,
            offset: self.offset,
            format: FormatOptions {
                delimiter: self.delimiter,
                key_delimiter: self.key_delimiter,
                print_offset: self.print_offset,
            },
            message_limit: self.count,
            exit_on_eof: self.exit,
            unbuffered: self.unbuffered,
            verbosity: self.verbosity(),
            metadata_timeout: kafka.metadata_timeout(),
            poll_timeout: kafka.poll_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envconfig::Envconfig;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kafka-tail").chain(args.iter().copied())).unwrap()
    }

    fn kafka_config() -> KafkaConfig {
        KafkaConfig::init_from_hashmap(&Default::default()).unwrap()
    }

    #[test]
    fn defaults_consume_everything_from_the_beginning() {
        let cli = parse(&["events"]);
        let config = cli.to_config(&kafka_config());

        assert_eq!(config.topic, "events");
        assert_eq!(config.partition, None);
        assert_eq!(config.offset, OffsetDirective::Earliest);
        assert_eq!(config.format, FormatOptions::default());
        assert_eq!(config.message_limit, None);
        assert!(!config.exit_on_eof);
        assert_eq!(config.verbosity, 1);
        assert_eq!(cli.log_level(), Level::WARN);
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = parse(&[
            "-p", "2", "-o", "-10", "-d", ",", "-k", "\\t", "-c", "50", "-e", "-O", "-u", "-vv",
            "events",
        ]);
        let config = cli.to_config(&kafka_config());

        assert_eq!(config.partition, Some(2));
        assert_eq!(config.offset, OffsetDirective::TailRelative(10));
        assert_eq!(
            config.format,
            FormatOptions {
                delimiter: b',',
                key_delimiter: Some(b'\t'),
                print_offset: true,
            }
        );
        assert_eq!(config.message_limit, Some(50));
        assert!(config.exit_on_eof);
        assert!(config.unbuffered);
        assert_eq!(config.verbosity, 3);
        assert_eq!(cli.log_level(), Level::DEBUG);
    }

    #[test]
    fn quiet_drops_to_errors_only() {
        let cli = parse(&["-q", "events"]);
        assert_eq!(cli.verbosity(), 0);
        assert_eq!(cli.log_level(), Level::ERROR);
    }

    #[test]
    fn brokers_and_properties() {
        let cli = parse(&[
            "-b",
            "k1:9092,k2:9092",
            "-X",
            "fetch.wait.max.ms=10",
            "-X",
            "topic.auto.offset.reset=latest",
            "events",
        ]);
        let mut kafka = kafka_config();
        cli.apply_overrides(&mut kafka);

        assert_eq!(kafka.kafka_hosts, "k1:9092,k2:9092");
        assert!(!cli.dump_requested());
        assert_eq!(
            cli.overrides(),
            vec![
                ("fetch.wait.max.ms".to_string(), "10".to_string()),
                ("topic.auto.offset.reset".to_string(), "latest".to_string()),
            ]
        );
    }

    #[test]
    fn dump_mixes_with_properties() {
        let cli = parse(&["-X", "dump", "-X", "client.id=tail", "events"]);

        assert!(cli.dump_requested());
        assert_eq!(
            cli.overrides(),
            vec![("client.id".to_string(), "tail".to_string())]
        );
    }

    #[test]
    fn bad_values_are_rejected() {
        for args in [
            vec!["-o", "abc", "events"],
            vec!["-d", "ab", "events"],
            vec!["-X", "novalue", "events"],
            vec![],
        ] {
            let argv = std::iter::once("kafka-tail").chain(args.iter().copied());
            assert!(Cli::try_parse_from(argv).is_err(), "{args:?} should fail");
        }
    }
}
