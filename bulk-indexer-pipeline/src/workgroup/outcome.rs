//! Result of a workgroup run.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::errors::PipelineError;

/// Counters gathered over one run.
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Documents pushed by the generator.
    pub produced: u64,
    /// Documents written to the index.
    pub indexed: u64,
    /// Bulk batches written to the index.
    pub batches: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl RunStats {
    pub(crate) fn empty(started_at: DateTime<Utc>, elapsed: Duration) -> Self {
        Self {
            produced: 0,
            indexed: 0,
            batches: 0,
            started_at,
            elapsed,
        }
    }

    /// Indexed documents per second.
    pub fn throughput(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            self.indexed as f64 / seconds
        } else {
            0.0
        }
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every document was written and serving settings were restored.
    Completed(RunStats),
    /// The stop flag was raised; serving settings were left untouched.
    Cancelled(RunStats),
    /// The run failed.
    Failed(PipelineError),
}

impl RunOutcome {
    /// `true` for completed and cancelled runs; cancellation is not an error.
    pub fn is_success(&self) -> bool {
        !matches!(self, RunOutcome::Failed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled(_))
    }

    /// Statistics of a run that got past provisioning or was cancelled.
    pub fn stats(&self) -> Option<&RunStats> {
        match self {
            RunOutcome::Completed(stats) | RunOutcome::Cancelled(stats) => Some(stats),
            RunOutcome::Failed(_) => None,
        }
    }

    /// Convert into a `Result`, keeping cancelled runs on the `Ok` side.
    pub fn into_result(self) -> Result<RunStats, PipelineError> {
        match self {
            RunOutcome::Completed(stats) | RunOutcome::Cancelled(stats) => Ok(stats),
            RunOutcome::Failed(e) => Err(e),
        }
    }
}
