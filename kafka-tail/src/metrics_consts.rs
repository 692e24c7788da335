/// Counter for records written to the output sink
pub const RECORDS_EMITTED_COUNTER: &str = "kafka_tail_records_emitted_total";

/// Counter for end-of-partition signals received
pub const PARTITION_EOF_COUNTER: &str = "kafka_tail_partition_eof_total";

/// Counter for non-EOF consume errors, each one ends the run
pub const STREAM_ERROR_COUNTER: &str = "kafka_tail_stream_errors_total";

/// Counter for runs ending in a fatal error, labelled by error type
pub const FATAL_ERROR_COUNTER: &str = "kafka_tail_fatal_errors_total";
