use async_trait::async_trait;

use crate::server::error::Error;

/// Outcome of one sweep over a time-indexed collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries found past their deadline
    pub examined: usize,
    /// Entries retired with their full side effects
    pub retired: usize,
    /// Entries deleted without side effects because their guild or member is gone
    pub orphaned: usize,
    /// Entries left in place after a failure, retried next tick
    pub failed: usize,
}

/// Removes every entry of one collection whose deadline is at or before `now_ms`.
///
/// A sweep handles entries one at a time and isolates their failures: a failed entry is logged
/// and counted, it never stops the sweep. `Err` is reserved for failing to read the collection.
#[async_trait]
pub trait ExpirySweep: Send + Sync {
    fn name(&self) -> &'static str;

    async fn sweep(&self, now_ms: i64) -> Result<SweepReport, Error>;
}

/// How an expired entry left its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Retirement {
    Retired,
    Orphaned,
}

impl SweepReport {
    pub(crate) fn record(&mut self, outcome: &Result<Retirement, Error>) {
        self.examined += 1;

        match outcome {
            Ok(Retirement::Retired) => self.retired += 1,
            Ok(Retirement::Orphaned) => self.orphaned += 1,
            Err(_) => self.failed += 1,
        }
    }
}
