//! Explicit polling policy for remote job status checks.

use std::time::Duration;

/// How the pipeline waits on a remote transcript job.
///
/// The delay before status check `n` grows linearly from `initial_interval_secs`
/// by two seconds per check, capped at `max_interval_secs`. Exhausting
/// `max_attempts` aborts the analysis instead of waiting forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub initial_interval_secs: u64,
    pub max_interval_secs: u64,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval_secs: 5,
            max_interval_secs: 30,
            max_attempts: 120,
        }
    }
}

impl PollPolicy {
    /// Delay to sleep before status check `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1) as u64;
        let secs = (self.initial_interval_secs + (attempt - 1) * 2).min(self.max_interval_secs);
        Duration::from_secs(secs)
    }

    /// Total wall-clock wait if every attempt is used. The final status check
    /// is not followed by a delay, so the last interval does not count.
    pub fn total_budget_secs(&self) -> u64 {
        (1..self.max_attempts)
            .map(|attempt| self.delay_for(attempt).as_secs())
            .sum()
    }
}
