//! In-memory collaborators used by unit tests and the tests/ directory.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::error::SourceError;
use crate::offset::OffsetDirective;
use crate::source::{PartitionSource, RecordQueue};
use crate::types::{ConsumedRecord, PartitionId, TopicMetadata};

/// Lifecycle calls seen by a `FakeSource`, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    Open(PartitionId, OffsetDirective),
    Close(PartitionId),
    Release,
}

/// Scripted `PartitionSource` + `RecordQueue`.
///
/// Each `dequeue` pops one scripted batch. Once the script is exhausted it
/// either returns empty batches or, with `endless`, generates data records
/// round-robin over the opened partitions.
#[derive(Debug)]
pub struct FakeSource {
    metadata: TopicMetadata,
    metadata_error: Option<String>,
    fail_open: Option<PartitionId>,
    batches: VecDeque<Vec<ConsumedRecord>>,
    endless: bool,
    next_offsets: Vec<(PartitionId, i64)>,
    calls: Vec<SourceCall>,
    dequeues: usize,
}

impl FakeSource {
    pub fn new(metadata: TopicMetadata) -> Self {
        Self {
            metadata,
            metadata_error: None,
            fail_open: None,
            batches: VecDeque::new(),
            endless: false,
            next_offsets: Vec::new(),
            calls: Vec::new(),
            dequeues: 0,
        }
    }

    pub fn fail_metadata(mut self, detail: &str) -> Self {
        self.metadata_error = Some(detail.to_string());
        self
    }

    pub fn fail_open(mut self, partition: PartitionId) -> Self {
        self.fail_open = Some(partition);
        self
    }

    pub fn with_batch(mut self, batch: Vec<ConsumedRecord>) -> Self {
        self.batches.push_back(batch);
        self
    }

    pub fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    pub fn calls(&self) -> &[SourceCall] {
        &self.calls
    }

    pub fn opened(&self) -> Vec<PartitionId> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SourceCall::Open(partition, _) => Some(*partition),
                _ => None,
            })
            .collect()
    }

    pub fn closed(&self) -> Vec<PartitionId> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SourceCall::Close(partition) => Some(*partition),
                _ => None,
            })
            .collect()
    }

    pub fn released(&self) -> bool {
        self.calls.contains(&SourceCall::Release)
    }

    pub fn dequeues(&self) -> usize {
        self.dequeues
    }

    fn generate(&mut self) -> Vec<ConsumedRecord> {
        self.next_offsets
            .iter_mut()
            .map(|(partition, offset)| {
                let payload = format!("p{partition}-{offset}");
                let record = data(*partition, *offset, payload.as_bytes());
                *offset += 1;
                record
            })
            .collect()
    }
}

impl PartitionSource for FakeSource {
    fn fetch_topic_metadata(
        &self,
        _topic: &str,
        _timeout: Duration,
    ) -> Result<TopicMetadata, SourceError> {
        match &self.metadata_error {
            Some(detail) => Err(SourceError::Unavailable(detail.clone())),
            None => Ok(self.metadata.clone()),
        }
    }

    fn open_partition_stream(
        &mut self,
        _topic: &str,
        partition: PartitionId,
        offset: OffsetDirective,
    ) -> Result<(), SourceError> {
        if self.fail_open == Some(partition) {
            return Err(SourceError::Unavailable(format!("partition {partition} unavailable")));
        }
        self.calls.push(SourceCall::Open(partition, offset));
        self.next_offsets.push((partition, 0));
        Ok(())
    }

    fn close_partition_stream(
        &mut self,
        _topic: &str,
        partition: PartitionId,
    ) -> Result<(), SourceError> {
        self.calls.push(SourceCall::Close(partition));
        self.next_offsets.retain(|(p, _)| *p != partition);
        Ok(())
    }

    fn release_queue(&mut self) -> Result<(), SourceError> {
        self.calls.push(SourceCall::Release);
        Ok(())
    }
}

impl RecordQueue for FakeSource {
    fn dequeue(&mut self, _max_wait: Duration) -> Result<Vec<ConsumedRecord>, SourceError> {
        self.dequeues += 1;
        if let Some(batch) = self.batches.pop_front() {
            return Ok(batch);
        }
        if self.endless {
            return Ok(self.generate());
        }
        Ok(Vec::new())
    }
}

pub fn data(partition: PartitionId, offset: i64, payload: &[u8]) -> ConsumedRecord {
    ConsumedRecord::Data {
        partition,
        offset,
        key: Vec::new(),
        payload: payload.to_vec(),
    }
}

pub fn end(partition: PartitionId, offset: i64) -> ConsumedRecord {
    ConsumedRecord::PartitionEnd {
        partition,
        offset: Some(offset),
    }
}

/// Sink that accepts `limit` bytes and then fails every write.
#[derive(Debug)]
pub struct FailingWriter {
    remaining: usize,
}

impl FailingWriter {
    pub fn after(limit: usize) -> Self {
        Self { remaining: limit }
    }
}

impl io::Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
        }
        let n = buf.len().min(self.remaining);
        self.remaining -= n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
