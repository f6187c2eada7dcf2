//! Expiry policy and the tick clock.
//!
//! The cache measures time in ticks: milliseconds since the Unix epoch.
//! Callers pass `now` into every decision so behavior is deterministic
//! under test; [`now_ticks`] is the production clock.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::key::EntryMeta;

/// Milliseconds since the Unix epoch.
pub type Ticks = u64;

/// Current wall-clock tick count.
pub fn now_ticks() -> Ticks {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Convert a time-to-live duration into ticks.
pub fn ttl_ticks(ttl: Duration) -> Ticks {
    ttl.as_millis() as u64
}

impl EntryMeta {
    /// Whether this entry is stale at `now`. An entry expires exactly at
    /// its `expires_at` tick.
    pub fn is_expired(&self, now: Ticks) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::Fingerprint;

    fn meta(expires_at: Ticks) -> EntryMeta {
        EntryMeta {
            fingerprint: Fingerprint::of("k"),
            expires_at,
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let m = meta(5000);
        assert!(!m.is_expired(4999));
        assert!(m.is_expired(5000));
        assert!(m.is_expired(5001));
    }

    #[test]
    fn test_never_expiring_zero_now() {
        assert!(!meta(1).is_expired(0));
        assert!(meta(0).is_expired(0));
    }

    #[test]
    fn test_ttl_ticks_is_milliseconds() {
        assert_eq!(ttl_ticks(Duration::from_secs(1)), 1000);
        assert_eq!(ttl_ticks(Duration::from_millis(1500)), 1500);
    }
}
