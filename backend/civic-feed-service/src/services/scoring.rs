//! Engagement scoring
//!
//! Maps an item's interaction counters and age to a relevance score:
//!
//! ```text
//! base  = likes*3 + views*0.5 + avg_watch_time*2 + shares*10
//! decay = 0.5 ^ (age_days / 7)
//! boost = 2 if age < 24h, 1.5 if age < 48h, else 1
//! score = round2(base * decay * boost)
//! ```
//!
//! Pure and infallible: missing or malformed inputs count as zero.

use chrono::{DateTime, Utc};

use crate::models::{ContentItem, EngagementCounters};

pub const LIKE_WEIGHT: f64 = 3.0;
pub const VIEW_WEIGHT: f64 = 0.5;
pub const WATCH_TIME_WEIGHT: f64 = 2.0;
pub const SHARE_WEIGHT: f64 = 10.0;

/// Score halves every 7 days
pub const HALF_LIFE_DAYS: f64 = 7.0;

const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Score an item at `now`
pub fn score_item(item: &ContentItem, now: DateTime<Utc>) -> f64 {
    score(&item.engagement, item.created_at, now)
}

/// Score a set of counters for content created at `created_at`
pub fn score(counters: &EngagementCounters, created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let base = base_score(counters);
    let age_ms = age_millis(created_at, now);

    let value = base * decay_factor(age_ms / MS_PER_DAY) * recency_boost(age_ms / MS_PER_HOUR);
    round2(value)
}

/// Weighted sum of the interaction signals
pub fn base_score(counters: &EngagementCounters) -> f64 {
    let base = counters.likes_count as f64 * LIKE_WEIGHT
        + counters.views_count as f64 * VIEW_WEIGHT
        + counters.avg_watch_time() * WATCH_TIME_WEIGHT
        + counters.shares_count as f64 * SHARE_WEIGHT;

    if base.is_finite() {
        base
    } else {
        0.0
    }
}

/// Exponential decay with a 7 day half-life
pub fn decay_factor(age_days: f64) -> f64 {
    0.5_f64.powf(age_days.max(0.0) / HALF_LIFE_DAYS)
}

/// Step bonus for young content
pub fn recency_boost(age_hours: f64) -> f64 {
    if age_hours < 24.0 {
        2.0
    } else if age_hours < 48.0 {
        1.5
    } else {
        1.0
    }
}

// Content stamped in the future (clock skew) is treated as brand new.
fn age_millis(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - created_at).num_milliseconds().max(0) as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
