use chrono::{DateTime, Duration, Utc};

/// Default reading window: the 24 hours up to now.
pub fn default_window() -> (DateTime<Utc>, DateTime<Utc>) {
    let now = Utc::now();
    (now - Duration::hours(24), now)
}

/// Human-readable age of a last-seen timestamp, truncated to seconds.
/// A timestamp in the future clamps to zero.
pub fn last_seen_age(last_seen: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = (now - last_seen).to_std().unwrap_or_default();
    humantime::format_duration(std::time::Duration::from_secs(age.as_secs())).to_string()
}
