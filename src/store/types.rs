use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// Default time-to-live for set and counter writes (40 minutes)
pub const DEFAULT_TTL_MS: u64 = 2_400_000;

/// Default reaper cadence
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 5_000;

/// A pending expiry for one key.
///
/// The store keeps at most one of these per key in the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledExpiry {
    pub key: String,
    pub execute_at: Instant,
}

impl ScheduledExpiry {
    pub fn new(key: impl Into<String>, execute_at: Instant) -> Self {
        Self {
            key: key.into(),
            execute_at,
        }
    }

    /// Returns true once the deadline is at or before `now`
    pub fn is_due(&self, now: Instant) -> bool {
        self.execute_at <= now
    }
}

/// Value stored under a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyedPayload {
    /// Membership-only set of tags
    Set(HashSet<String>),
    /// Single integer, used for turn counts
    Counter(i64),
}

/// Payload plus its current deadline (`None` = never expires)
#[derive(Debug, Clone)]
pub(crate) struct StoredEntry {
    pub payload: KeyedPayload,
    pub expires_at: Option<Instant>,
}

impl StoredEntry {
    pub fn is_live(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => deadline > now,
            None => true,
        }
    }
}

/// Tuning knobs for a store instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// TTL applied by the `add_to_set`/`add_to_number` shorthands.
    /// `Duration::ZERO` disables expiry.
    pub default_ttl: Duration,
    /// How often the reaper sweeps the scheduler
    pub cleanup_interval: Duration,
}

impl StoreConfig {
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_millis(DEFAULT_TTL_MS),
            cleanup_interval: Duration::from_millis(DEFAULT_CLEANUP_INTERVAL_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_expiry_is_due() {
        let now = Instant::now();
        let entry = ScheduledExpiry::new("k", now);
        assert!(entry.is_due(now));
        assert!(!entry.is_due(now - Duration::from_millis(1)));
    }

    #[test]
    fn test_entry_without_deadline_is_always_live() {
        let entry = StoredEntry {
            payload: KeyedPayload::Counter(1),
            expires_at: None,
        };
        assert!(entry.is_live(Instant::now() + Duration::from_secs(86_400)));
    }

    #[test]
    fn test_entry_expires_at_deadline() {
        let now = Instant::now();
        let entry = StoredEntry {
            payload: KeyedPayload::Set(HashSet::new()),
            expires_at: Some(now + Duration::from_millis(10)),
        };
        assert!(entry.is_live(now));
        assert!(!entry.is_live(now + Duration::from_millis(10)));
    }

    #[test]
    fn test_store_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.default_ttl, Duration::from_millis(2_400_000));
        assert_eq!(config.cleanup_interval, Duration::from_millis(5_000));

        let config = config.with_cleanup_interval(Duration::from_secs(1));
        assert_eq!(config.cleanup_interval, Duration::from_secs(1));
    }
}
