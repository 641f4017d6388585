//! Per-identity notification cooldown.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// Minimum time between two notifications for the same identifier.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60 * 60);

/// Last-notified time per identifier.
///
/// Entries are never evicted. `should_notify` is a read-modify-write: callers
/// sharing a throttle between threads must serialise it behind a `Mutex`.
#[derive(Debug, Clone)]
pub struct NotificationThrottle {
    cooldown: Duration,
    last_notified: HashMap<String, SystemTime>,
}

impl Default for NotificationThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl NotificationThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_notified: HashMap::new(),
        }
    }

    /// Returns true, and stamps `now`, if `identifier` has never been
    /// notified or its last notification is at least one cooldown old.
    ///
    /// A clock that went backwards since the last stamp counts as zero
    /// elapsed time, so per-key stamps never decrease.
    pub fn should_notify(&mut self, identifier: &str, now: SystemTime) -> bool {
        let allowed = match self.last_notified.get(identifier) {
            None => true,
            Some(last) => now.duration_since(*last).unwrap_or(Duration::ZERO) >= self.cooldown,
        };
        if allowed {
            self.last_notified.insert(identifier.to_string(), now);
        }
        allowed
    }

    pub fn last_notified(&self, identifier: &str) -> Option<SystemTime> {
        self.last_notified.get(identifier).copied()
    }

    pub fn len(&self) -> usize {
        self.last_notified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_notified.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn first_call_allows() {
        let mut throttle = NotificationThrottle::default();
        assert!(throttle.should_notify("ana", at(1_000)));
        assert_eq!(throttle.last_notified("ana"), Some(at(1_000)));
    }

    #[test]
    fn second_call_allowed_iff_cooldown_elapsed() {
        for delta in [0u64, 1, 1_800, 3_599, 3_600, 3_601, 86_400] {
            let mut throttle = NotificationThrottle::default();
            assert!(throttle.should_notify("1234ABC", at(10_000)));
            assert_eq!(
                throttle.should_notify("1234ABC", at(10_000 + delta)),
                delta >= 3_600,
                "delta = {}",
                delta
            );
        }
    }

    #[test]
    fn denied_call_does_not_restamp() {
        let mut throttle = NotificationThrottle::default();
        assert!(throttle.should_notify("ana", at(0)));
        assert!(!throttle.should_notify("ana", at(3_000)));
        assert_eq!(throttle.last_notified("ana"), Some(at(0)));
        assert!(throttle.should_notify("ana", at(3_600)));
        assert_eq!(throttle.last_notified("ana"), Some(at(3_600)));
    }

    #[test]
    fn identifiers_are_independent() {
        let mut throttle = NotificationThrottle::default();
        assert!(throttle.should_notify("ana", at(0)));
        assert!(throttle.should_notify("brais", at(1)));
        assert!(!throttle.should_notify("ana", at(2)));
        assert_eq!(throttle.len(), 2);
    }

    #[test]
    fn clock_going_backwards_is_throttled() {
        let mut throttle = NotificationThrottle::default();
        assert!(throttle.should_notify("ana", at(10_000)));
        assert!(!throttle.should_notify("ana", at(1_000)));
        assert_eq!(throttle.last_notified("ana"), Some(at(10_000)));
    }

    #[test]
    fn custom_cooldown() {
        let mut throttle = NotificationThrottle::new(Duration::from_secs(60));
        assert!(throttle.should_notify("ana", at(0)));
        assert!(!throttle.should_notify("ana", at(59)));
        assert!(throttle.should_notify("ana", at(60)));
    }
}
