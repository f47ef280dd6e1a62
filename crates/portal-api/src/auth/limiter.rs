use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Counts failed logins per client address over a sliding window.
///
/// An address is blocked while `max_failures` of its failures fall inside the last
/// `window`. Only the most recent `max_failures` timestamps are kept per address.
#[derive(Clone)]
pub struct AuthFailureLimiter {
    inner: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    max_failures: u32,
    window: Duration,
}

impl AuthFailureLimiter {
    pub fn new(max_failures: u32, window_seconds: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_failures: max_failures.max(1),
            window: Duration::from_secs(window_seconds),
        }
    }

    fn evict(&self, failures: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = failures.front() {
            if oldest + self.window > now {
                break;
            }
            failures.pop_front();
        }
    }

    /// Record a failure; returns true when the address is now blocked.
    pub async fn record_failure(&self, ip: &str) -> bool {
        self.record_failure_at(ip, Instant::now()).await
    }

    async fn record_failure_at(&self, ip: &str, now: Instant) -> bool {
        let mut guard = self.inner.lock().await;
        let failures = guard.entry(ip.to_string()).or_default();
        self.evict(failures, now);
        failures.push_back(now);
        while failures.len() > self.max_failures as usize {
            failures.pop_front();
        }
        failures.len() >= self.max_failures as usize
    }

    /// Remaining block time for the address, if it is blocked.
    pub async fn blocked_for(&self, ip: &str) -> Option<Duration> {
        self.blocked_for_at(ip, Instant::now()).await
    }

    async fn blocked_for_at(&self, ip: &str, now: Instant) -> Option<Duration> {
        let mut guard = self.inner.lock().await;
        let failures = guard.get_mut(ip)?;
        self.evict(failures, now);
        if failures.is_empty() {
            guard.remove(ip);
            return None;
        }
        if failures.len() < self.max_failures as usize {
            return None;
        }
        failures
            .front()
            .map(|&oldest| (oldest + self.window).saturating_duration_since(now))
    }

    /// Forget the address after a successful login.
    pub async fn clear(&self, ip: &str) {
        self.inner.lock().await.remove(ip);
    }

    /// Drop addresses with no failures left in the window. Called periodically so the
    /// map stays bounded.
    pub async fn prune(&self) {
        let now = Instant::now();
        let mut guard = self.inner.lock().await;
        guard.retain(|_, failures| {
            self.evict(failures, now);
            !failures.is_empty()
        });
    }
}
