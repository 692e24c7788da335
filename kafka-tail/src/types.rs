pub type PartitionId = i32;

/// One unit drained from the shared queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumedRecord {
    Data {
        partition: PartitionId,
        offset: i64,
        key: Vec<u8>,
        payload: Vec<u8>,
    },
    /// No further records are currently available on the partition.
    PartitionEnd {
        partition: PartitionId,
        offset: Option<i64>,
    },
    /// librdkafka does not attribute every consume error to a partition.
    Error {
        partition: Option<PartitionId>,
        detail: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionMetadata {
    pub id: PartitionId,
    pub error: Option<String>,
}

impl PartitionMetadata {
    pub fn new(id: PartitionId) -> Self {
        Self { id, error: None }
    }
}

/// Topic layout as reported by the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMetadata {
    pub exists: bool,
    pub error: Option<String>,
    pub partitions: Vec<PartitionMetadata>,
}

impl TopicMetadata {
    pub fn missing() -> Self {
        Self {
            exists: false,
            error: None,
            partitions: Vec::new(),
        }
    }

    pub fn with_partitions(count: PartitionId) -> Self {
        Self {
            exists: true,
            error: None,
            partitions: (0..count).map(PartitionMetadata::new).collect(),
        }
    }
}

/// Ordered partition ids of a topic, immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSet {
    partitions: Vec<PartitionId>,
}

impl PartitionSet {
    pub fn new(partitions: Vec<PartitionId>) -> Self {
        Self { partitions }
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn contains(&self, partition: PartitionId) -> bool {
        self.partitions.contains(&partition)
    }

    pub fn iter(&self) -> impl Iterator<Item = PartitionId> + '_ {
        self.partitions.iter().copied()
    }

    /// Highest valid partition id when ids are dense, used in diagnostics.
    pub fn max_id(&self) -> i64 {
        i64::try_from(self.partitions.len()).unwrap_or(i64::MAX) - 1
    }
}
