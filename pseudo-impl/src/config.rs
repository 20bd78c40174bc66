use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);
pub const MIN_TIMEOUT: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_CALL_DEPTH: usize = 512;

/// How time spent waiting for input affects the execution budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeoutPolicy {
    /// Every answered input request restarts the full budget.
    #[default]
    ResetAfterInput,
    /// The budget covers all non-waiting time across the whole run.
    Cumulative,
}

/// Limits applied to one sandboxed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    timeout: Duration,
    timeout_policy: TimeoutPolicy,
    max_call_depth: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            timeout: DEFAULT_TIMEOUT,
            timeout_policy: TimeoutPolicy::default(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl SandboxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the execution budget. Values below one second are raised to one second.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.max(MIN_TIMEOUT);
        self
    }

    pub fn timeout_ms(self, millis: u64) -> Self {
        self.timeout(Duration::from_millis(millis))
    }

    pub fn timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth.max(1);
        self
    }

    pub fn budget(&self) -> Duration {
        self.timeout
    }

    pub fn policy(&self) -> TimeoutPolicy {
        self.timeout_policy
    }

    pub fn call_depth_limit(&self) -> usize {
        self.max_call_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SandboxConfig::default();
        assert_eq!(config.budget(), Duration::from_millis(5000));
        assert_eq!(config.policy(), TimeoutPolicy::ResetAfterInput);
        assert_eq!(config.call_depth_limit(), 512);
    }

    #[test]
    fn timeout_is_clamped() {
        assert_eq!(SandboxConfig::new().timeout_ms(10).budget(), MIN_TIMEOUT);
        assert_eq!(
            SandboxConfig::new().timeout_ms(2500).budget(),
            Duration::from_millis(2500)
        );
    }
}
