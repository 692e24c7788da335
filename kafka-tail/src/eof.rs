use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::types::{PartitionId, PartitionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionEofState {
    Active,
    AtEof,
}

/// What observing an end-of-partition signal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EofOutcome {
    /// exit-on-EOF is off, the partition may still receive data later.
    Ignored,
    /// Partition was already at EOF, or is not being consumed.
    Unchanged,
    /// Partition moved to EOF; `remaining` more are needed to stop.
    Reached { remaining: usize },
    /// Threshold met, the run should stop.
    ThresholdReached,
}

/// Tracks which consumed partitions have hit end-of-partition and decides
/// when the whole run is done.
#[derive(Debug)]
pub struct EofTracker {
    exit_on_eof: bool,
    states: BTreeMap<PartitionId, PartitionEofState>,
    eof_count: usize,
    threshold: usize,
}

impl EofTracker {
    /// A single selected partition stops the run on its own EOF; otherwise
    /// every partition in the set has to get there.
    pub fn new(
        partitions: &PartitionSet,
        selection: Option<PartitionId>,
        exit_on_eof: bool,
    ) -> Self {
        let states: BTreeMap<_, _> = match selection {
            Some(partition) => [(partition, PartitionEofState::Active)].into(),
            None => partitions
                .iter()
                .map(|partition| (partition, PartitionEofState::Active))
                .collect(),
        };
        let threshold = match selection {
            Some(_) => 1,
            None => partitions.len(),
        };

        Self {
            exit_on_eof,
            states,
            eof_count: 0,
            threshold,
        }
    }

    pub fn observe(
        &mut self,
        topic: &str,
        partition: PartitionId,
        offset: Option<i64>,
    ) -> EofOutcome {
        if !self.exit_on_eof {
            debug!(
                "reached end of topic {} [{}] at offset {}",
                topic,
                partition,
                display_offset(offset)
            );
            return EofOutcome::Ignored;
        }

        let Some(state) = self.states.get_mut(&partition) else {
            debug!(
                "ignoring end of partition for unconsumed {} [{}]",
                topic, partition
            );
            return EofOutcome::Unchanged;
        };

        if *state == PartitionEofState::AtEof {
            return EofOutcome::Unchanged;
        }

        *state = PartitionEofState::AtEof;
        self.eof_count += 1;

        let outcome = if self.eof_count >= self.threshold {
            EofOutcome::ThresholdReached
        } else {
            EofOutcome::Reached {
                remaining: self.threshold - self.eof_count,
            }
        };

        info!(
            "reached end of topic {} [{}] at offset {}{}",
            topic,
            partition,
            display_offset(offset),
            if outcome == EofOutcome::ThresholdReached {
                ": exiting"
            } else {
                ""
            }
        );

        outcome
    }

    pub fn state(&self, partition: PartitionId) -> Option<PartitionEofState> {
        self.states.get(&partition).copied()
    }

    pub fn eof_count(&self) -> usize {
        self.eof_count
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

fn display_offset(offset: Option<i64>) -> String {
    offset.map_or_else(|| "unknown".to_string(), |offset| offset.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_partitions() -> PartitionSet {
        PartitionSet::new(vec![0, 1, 2])
    }

    #[test]
    fn all_partitions_must_reach_eof_without_selection() {
        let mut tracker = EofTracker::new(&three_partitions(), None, true);
        assert_eq!(tracker.threshold(), 3);

        assert_eq!(
            tracker.observe("t", 2, Some(10)),
            EofOutcome::Reached { remaining: 2 }
        );
        assert_eq!(
            tracker.observe("t", 0, Some(4)),
            EofOutcome::Reached { remaining: 1 }
        );
        assert_eq!(tracker.observe("t", 1, None), EofOutcome::ThresholdReached);
        assert_eq!(tracker.eof_count(), 3);
    }

    #[test]
    fn selected_partition_alone_reaches_threshold() {
        let mut tracker = EofTracker::new(&three_partitions(), Some(1), true);
        assert_eq!(tracker.threshold(), 1);

        // Other partitions are out of scope
        assert_eq!(tracker.observe("t", 0, Some(3)), EofOutcome::Unchanged);
        assert_eq!(
            tracker.observe("t", 1, Some(3)),
            EofOutcome::ThresholdReached
        );
    }

    #[test]
    fn repeated_eof_is_counted_once() {
        let mut tracker = EofTracker::new(&three_partitions(), None, true);
        tracker.observe("t", 0, Some(1));
        assert_eq!(tracker.observe("t", 0, Some(5)), EofOutcome::Unchanged);
        assert_eq!(tracker.observe("t", 0, Some(9)), EofOutcome::Unchanged);

        assert_eq!(tracker.eof_count(), 1);
        assert_eq!(tracker.state(0), Some(PartitionEofState::AtEof));
        assert_eq!(tracker.state(1), Some(PartitionEofState::Active));
    }

    #[test]
    fn eof_is_ignored_when_exit_disabled() {
        let mut tracker = EofTracker::new(&three_partitions(), None, false);
        for partition in [0, 1, 2, 0, 1, 2] {
            assert_eq!(tracker.observe("t", partition, None), EofOutcome::Ignored);
        }
        assert_eq!(tracker.eof_count(), 0);
        assert_eq!(tracker.state(0), Some(PartitionEofState::Active));
    }

    #[test]
    fn count_never_exceeds_partitions_in_scope() {
        let mut tracker = EofTracker::new(&three_partitions(), None, true);
        for partition in [0, 1, 2, 3, 2, 1, 0, -1] {
            tracker.observe("t", partition, None);
        }
        assert_eq!(tracker.eof_count(), 3);
        assert_eq!(tracker.state(3), None);
    }
}
