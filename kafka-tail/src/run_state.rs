use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfPartitions,
    MessageLimit,
    Fatal,
    Signal,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            StopReason::EndOfPartitions => "all partitions reached end of topic",
            StopReason::MessageLimit => "message count limit reached",
            StopReason::Fatal => "fatal error",
            StopReason::Signal => "shutdown signal received",
        };
        f.write_str(reason)
    }
}

/// One-way "keep running" flag shared between the consume loop and the
/// signal handler. Clones observe and stop the same run.
#[derive(Clone, Default)]
pub struct RunState {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    stopped: AtomicBool,
    reason: OnceLock<StopReason>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        !self.inner.stopped.load(Ordering::Acquire)
    }

    /// Returns true for the call that actually stopped the run; later calls
    /// keep the first reason.
    pub fn stop(&self, reason: StopReason) -> bool {
        let won = self
            .inner
            .stopped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            // Only the winning caller gets here, the cell is still empty
            let _ = self.inner.reason.set(reason);
        }
        won
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.inner.reason.get().copied()
    }
}

impl fmt::Debug for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunState")
            .field("running", &self.is_running())
            .field("reason", &self.stop_reason())
            .finish()
    }
}

/// Counters for a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Records written to the sink.
    pub rx: u64,
}
