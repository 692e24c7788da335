pub mod cli;
pub mod config;
pub mod consume_loop;
pub mod eof;
pub mod error;
pub mod formatter;
pub mod kafka;
pub mod metadata;
pub mod metrics_consts;
pub mod offset;
pub mod orchestrator;
pub mod run_state;
pub mod runner;
pub mod source;
pub mod types;

// Used in "mod tests" and tests/ directory (integration tests)
pub mod test_utils;

pub use config::{Config, KafkaConfig};
pub use error::ConsumeError;
pub use kafka::KafkaSource;
pub use offset::OffsetDirective;
pub use run_state::{RunState, Stats, StopReason};
