use serde::{Deserialize, Serialize};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// A cached dataset value and the time it was fetched.
///
/// `fetched_at == 0` marks a value that was never successfully fetched;
/// such an entry is never fresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    #[serde(rename = "fetchedAt")]
    pub fetched_at: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, fetched_at: i64) -> Self {
        Self { value, fetched_at }
    }

    pub fn is_fresh(&self, now: i64, ttl_millis: i64) -> bool {
        self.fetched_at != 0 && now - self.fetched_at < ttl_millis
    }

    pub fn age_minutes(&self, now: i64) -> i64 {
        (now - self.fetched_at) / MILLIS_PER_MINUTE
    }

    pub fn age_display(&self, now: i64) -> String {
        if self.fetched_at == 0 {
            return "never".to_string();
        }
        let minutes = self.age_minutes(now);
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}
