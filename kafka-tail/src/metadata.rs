use std::time::Duration;

use tracing::{debug, instrument};

use crate::error::MetadataError;
use crate::source::PartitionSource;
use crate::types::{PartitionId, PartitionSet};

/// Query the cluster for `topic` and validate it can be consumed.
///
/// When `selection` names a partition it must exist and be healthy; without a
/// selection every partition must be healthy. Metadata is not retried, a stale
/// answer does not heal itself within one run.
#[instrument(skip(source))]
pub fn resolve_partitions<S: PartitionSource>(
    source: &S,
    topic: &str,
    selection: Option<PartitionId>,
    timeout: Duration,
) -> Result<PartitionSet, MetadataError> {
    let metadata = source
        .fetch_topic_metadata(topic, timeout)
        .map_err(|source| MetadataError::Fetch {
            topic: topic.to_string(),
            source,
        })?;

    if !metadata.exists {
        return Err(MetadataError::TopicNotFound(topic.to_string()));
    }

    if let Some(detail) = metadata.error {
        return Err(MetadataError::TopicError {
            topic: topic.to_string(),
            detail,
        });
    }

    if metadata.partitions.is_empty() {
        return Err(MetadataError::NoPartitions(topic.to_string()));
    }

    let partitions = PartitionSet::new(metadata.partitions.iter().map(|p| p.id).collect());

    if let Some(wanted) = selection {
        if !partitions.contains(wanted) {
            return Err(MetadataError::PartitionNotFound {
                topic: topic.to_string(),
                partition: wanted,
                max: partitions.max_id(),
            });
        }
    }

    for partition in &metadata.partitions {
        if selection.is_some_and(|wanted| wanted != partition.id) {
            continue;
        }
        if let Some(detail) = &partition.error {
            return Err(MetadataError::PartitionError {
                topic: topic.to_string(),
                partition: partition.id,
                detail: detail.clone(),
            });
        }
    }

    debug!(
        "topic {} has {} partitions: {:?}",
        topic,
        partitions.len(),
        partitions.iter().collect::<Vec<_>>()
    );

    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeSource;
    use crate::types::{PartitionMetadata, TopicMetadata};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn returns_partitions_in_reported_order() {
        let mut metadata = TopicMetadata::with_partitions(0);
        metadata.partitions = vec![
            PartitionMetadata::new(2),
            PartitionMetadata::new(0),
            PartitionMetadata::new(1),
        ];
        let source = FakeSource::new(metadata);

        let partitions = resolve_partitions(&source, "events", None, TIMEOUT).unwrap();
        assert_eq!(partitions.iter().collect::<Vec<_>>(), vec![2, 0, 1]);
    }

    #[test]
    fn missing_topic_is_not_found() {
        let source = FakeSource::new(TopicMetadata::missing());
        match resolve_partitions(&source, "events", None, TIMEOUT) {
            Err(MetadataError::TopicNotFound(topic)) => assert_eq!(topic, "events"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn topic_level_error_is_surfaced() {
        let mut metadata = TopicMetadata::with_partitions(3);
        metadata.error = Some("Broker: Leader not available".to_string());
        let source = FakeSource::new(metadata);

        match resolve_partitions(&source, "events", None, TIMEOUT) {
            Err(MetadataError::TopicError { topic, detail }) => {
                assert_eq!(topic, "events");
                assert_eq!(detail, "Broker: Leader not available");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn topic_without_partitions_is_rejected() {
        let source = FakeSource::new(TopicMetadata::with_partitions(0));
        assert!(matches!(
            resolve_partitions(&source, "events", None, TIMEOUT),
            Err(MetadataError::NoPartitions(_))
        ));
    }

    #[test]
    fn unknown_selected_partition_reports_range() {
        let source = FakeSource::new(TopicMetadata::with_partitions(3));
        match resolve_partitions(&source, "events", Some(5), TIMEOUT) {
            Err(MetadataError::PartitionNotFound { partition, max, .. }) => {
                assert_eq!(partition, 5);
                assert_eq!(max, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn partition_errors_only_matter_when_in_scope() {
        let mut metadata = TopicMetadata::with_partitions(3);
        metadata.partitions[2].error = Some("Broker: Leader not available".to_string());
        let source = FakeSource::new(metadata);

        // Selecting a healthy partition ignores the broken one
        let partitions = resolve_partitions(&source, "events", Some(1), TIMEOUT).unwrap();
        assert_eq!(partitions.len(), 3);

        assert!(matches!(
            resolve_partitions(&source, "events", Some(2), TIMEOUT),
            Err(MetadataError::PartitionError { partition: 2, .. })
        ));
        assert!(matches!(
            resolve_partitions(&source, "events", None, TIMEOUT),
            Err(MetadataError::PartitionError { partition: 2, .. })
        ));
    }

    #[test]
    fn fetch_failure_is_wrapped_with_topic() {
        let source = FakeSource::new(TopicMetadata::with_partitions(1)).fail_metadata("timed out");
        match resolve_partitions(&source, "events", None, TIMEOUT) {
            Err(err @ MetadataError::Fetch { .. }) => {
                assert_eq!(
                    err.to_string(),
                    "failed to query metadata for topic events: timed out"
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
