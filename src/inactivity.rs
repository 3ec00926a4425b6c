use std::time::{Duration, Instant};

/// Detects silence while listening so an attempt never waits forever
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactivityMonitor {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for InactivityMonitor {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(5),
        }
    }
}

impl InactivityMonitor {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }

    /// When the next check should run, given the previous one
    pub fn next_poll(&self, from: Instant) -> Instant {
        from + self.poll_interval
    }

    /// True once more than `timeout` has passed since the last activity.
    pub fn is_inactive(&self, now: Instant, last_activity: Option<Instant>) -> bool {
        match last_activity {
            Some(last) => now.saturating_duration_since(last) > self.timeout,
            None => false,
        }
    }

    /// Silence measured as seen by the UI, if any activity has been recorded
    pub fn silence(&self, now: Instant, last_activity: Option<Instant>) -> Option<Duration> {
        last_activity.map(|last| now.saturating_duration_since(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timings() {
        let monitor = InactivityMonitor::default();
        assert_eq!(monitor.poll_interval, Duration::from_secs(2));
        assert_eq!(monitor.timeout, Duration::from_secs(5));
    }

    #[test]
    fn inactive_only_after_timeout_is_exceeded() {
        let monitor = InactivityMonitor::default();
        let start = Instant::now();

        assert!(!monitor.is_inactive(start + Duration::from_secs(4), Some(start)));
        assert!(!monitor.is_inactive(start + Duration::from_secs(5), Some(start)));
        assert!(monitor.is_inactive(start + Duration::from_millis(5001), Some(start)));
    }

    #[test]
    fn no_activity_recorded_is_not_inactive() {
        let monitor = InactivityMonitor::default();
        assert!(!monitor.is_inactive(Instant::now(), None));
        assert_eq!(monitor.silence(Instant::now(), None), None);
    }

    #[test]
    fn next_poll_adds_interval() {
        let monitor = InactivityMonitor::new(Duration::from_millis(500), Duration::from_secs(1));
        let now = Instant::now();
        assert_eq!(monitor.next_poll(now), now + Duration::from_millis(500));
    }
}
