use crate::config::ReadinessConfig;
use crate::error::{Error, Result};
use std::time::Duration;
use tracing::debug;

/// Anything whose staged byte count can be polled
pub trait SizeProbe {
    /// `None` means nothing staged yet
    fn staged_len(&self) -> Option<u64>;
}

/// Bounded retry: at most `max_attempts` checks, `poll_interval` apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Playback may start once the slot holds strictly more than this
    pub min_bytes: u64,
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl ReadinessPolicy {
    /// Longest the caller can be stalled
    pub fn max_wait(&self) -> Duration {
        self.poll_interval * self.max_attempts.saturating_sub(1)
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        ReadinessConfig::default().into()
    }
}

impl From<ReadinessConfig> for ReadinessPolicy {
    fn from(config: ReadinessConfig) -> Self {
        Self {
            min_bytes: config.min_bytes,
            poll_interval: config.poll_interval(),
            max_attempts: config.max_attempts,
        }
    }
}

pub struct ReadinessMonitor {
    policy: ReadinessPolicy,
}

impl ReadinessMonitor {
    pub fn new(policy: ReadinessPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ReadinessPolicy {
        &self.policy
    }

    /// Poll until the probe reports enough bytes. Returns the 1-based attempt
    /// that succeeded, or `NotReady` right after the last attempt fails.
    pub async fn wait<P: SizeProbe + ?Sized>(&self, probe: &P) -> Result<u32> {
        let policy = &self.policy;

        for attempt in 1..=policy.max_attempts {
            match probe.staged_len() {
                Some(len) if len > policy.min_bytes => {
                    debug!("Staged {} bytes, ready after {} checks", len, attempt);
                    return Ok(attempt);
                }
                Some(len) => debug!("Check {}: {} bytes staged", attempt, len),
                None => debug!("Check {}: nothing staged yet", attempt),
            }

            // no sleep after the final check
            if attempt < policy.max_attempts {
                tokio::time::sleep(policy.poll_interval).await;
            }
        }

        Err(Error::NotReady {
            attempts: policy.max_attempts,
            min_bytes: policy.min_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// Replays a fixed size per check; the last entry repeats forever
    struct ScriptedProbe {
        sizes: Vec<Option<u64>>,
        checks: AtomicUsize,
    }

    impl ScriptedProbe {
        fn new(sizes: Vec<Option<u64>>) -> Self {
            Self {
                sizes,
                checks: AtomicUsize::new(0),
            }
        }

        fn checks(&self) -> usize {
            self.checks.load(Ordering::SeqCst)
        }
    }

    impl SizeProbe for ScriptedProbe {
        fn staged_len(&self) -> Option<u64> {
            let n = self.checks.fetch_add(1, Ordering::SeqCst);
            let idx = n.min(self.sizes.len() - 1);
            self.sizes[idx]
        }
    }

    fn policy(max_attempts: u32) -> ReadinessPolicy {
        ReadinessPolicy {
            min_bytes: 20_000,
            poll_interval: Duration::from_millis(300),
            max_attempts,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_second_poll() {
        let probe = ScriptedProbe::new(vec![None, Some(25_000)]);
        let monitor = ReadinessMonitor::new(policy(60));

        let start = Instant::now();
        let attempt = monitor.wait(&probe).await.unwrap();

        assert_eq!(attempt, 2);
        assert_eq!(probe.checks(), 2);
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_immediately_when_already_staged() {
        let probe = ScriptedProbe::new(vec![Some(1_000_000)]);
        let monitor = ReadinessMonitor::new(policy(60));

        let start = Instant::now();
        assert_eq!(monitor.wait(&probe).await.unwrap(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_is_strict() {
        // exactly min_bytes is not enough
        let probe = ScriptedProbe::new(vec![Some(20_000), Some(20_000), Some(20_001)]);
        let monitor = ReadinessMonitor::new(policy(60));

        assert_eq!(monitor.wait(&probe).await.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_exactly_after_last_attempt() {
        let probe = ScriptedProbe::new(vec![None, Some(100), Some(19_999)]);
        let monitor = ReadinessMonitor::new(policy(5));

        let start = Instant::now();
        let err = monitor.wait(&probe).await.unwrap_err();

        assert!(matches!(
            err,
            Error::NotReady {
                attempts: 5,
                min_bytes: 20_000
            }
        ));
        assert_eq!(probe.checks(), 5);
        assert_eq!(start.elapsed(), Duration::from_millis(1200));
        assert_eq!(start.elapsed(), monitor.policy().max_wait());
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_the_very_last_attempt() {
        let probe = ScriptedProbe::new(vec![None, None, None, Some(30_000)]);
        let monitor = ReadinessMonitor::new(policy(4));

        assert_eq!(monitor.wait(&probe).await.unwrap(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_is_an_immediate_timeout() {
        let probe = ScriptedProbe::new(vec![Some(1_000_000)]);
        let monitor = ReadinessMonitor::new(policy(0));

        assert!(monitor.wait(&probe).await.is_err());
        assert_eq!(probe.checks(), 0);
    }

    #[test]
    fn test_default_policy_bound() {
        let policy = ReadinessPolicy::default();
        assert_eq!(policy.min_bytes, 20_000);
        assert_eq!(policy.max_attempts, 60);
        assert_eq!(policy.max_wait(), Duration::from_millis(300 * 59));
    }
}
