//! Cooperative execution budget.
//!
//! The interpreter polls [`Watchdog::check`] before every statement, loop
//! iteration and call. Time spent blocked on an input request is excluded by
//! pausing the watchdog around the wait.

use crate::config::TimeoutPolicy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    TimedOut,
    Cancelled,
}

#[derive(Debug)]
pub struct Watchdog {
    budget: Duration,
    policy: TimeoutPolicy,
    running_since: Option<Instant>,
    spent: Duration,
    cancelled: Arc<AtomicBool>,
}

impl Watchdog {
    /// Start timing immediately.
    pub fn start(budget: Duration, policy: TimeoutPolicy, cancelled: Arc<AtomicBool>) -> Self {
        Watchdog {
            budget,
            policy,
            running_since: Some(Instant::now()),
            spent: Duration::ZERO,
            cancelled,
        }
    }

    /// Time counted against the budget so far.
    pub fn elapsed(&self) -> Duration {
        self.spent + self.running_since.map_or(Duration::ZERO, |since| since.elapsed())
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn check(&self) -> Result<(), Stop> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(Stop::Cancelled);
        }
        if self.running_since.is_some() && self.elapsed() >= self.budget {
            return Err(Stop::TimedOut);
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.spent += since.elapsed();
        }
    }

    pub fn resume(&mut self) {
        if self.running_since.is_some() {
            return;
        }
        if self.policy == TimeoutPolicy::ResetAfterInput {
            self.spent = Duration::ZERO;
        }
        self.running_since = Some(Instant::now());
    }
}
