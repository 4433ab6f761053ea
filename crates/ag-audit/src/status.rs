// status.rs - Agent liveness and relative-time labels.
//
// Both are pure functions of (now, timestamp). The caller supplies `now`
// once per render so every row on screen is classified against the same
// instant.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Liveness bucket derived from how long ago an agent was last seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Seen less than 5 minutes ago.
    Online,
    /// Seen less than 30 minutes ago.
    Idle,
    /// Seen 30 minutes ago or earlier, or never.
    Offline,
}

impl AgentStatus {
    /// Classify `last_seen` relative to `now`. A missing timestamp is offline.
    pub fn classify(now: DateTime<Utc>, last_seen: Option<DateTime<Utc>>) -> Self {
        let Some(last_seen) = last_seen else {
            return AgentStatus::Offline;
        };
        let age = now - last_seen;
        if age < Duration::minutes(5) {
            AgentStatus::Online
        } else if age < Duration::minutes(30) {
            AgentStatus::Idle
        } else {
            AgentStatus::Offline
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgentStatus::Online => "Online",
            AgentStatus::Idle => "Idle",
            AgentStatus::Offline => "Offline",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Human label for how long ago `timestamp` was.
///
/// Each bucket includes its lower bound: exactly 60 minutes is "1h ago",
/// exactly 24 hours is "1d ago". Anything a week or older falls back to the
/// absolute date. Timestamps in the future read as "Just now".
pub fn relative_time(now: DateTime<Utc>, timestamp: Option<DateTime<Utc>>) -> String {
    let Some(timestamp) = timestamp else {
        return "Never".to_string();
    };
    let age = now - timestamp;
    let minutes = age.num_minutes();
    let hours = age.num_hours();
    let days = age.num_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        timestamp.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn ago(d: Duration) -> Option<DateTime<Utc>> {
        Some(now() - d)
    }

    #[test]
    fn status_buckets() {
        assert_eq!(AgentStatus::classify(now(), None), AgentStatus::Offline);
        assert_eq!(
            AgentStatus::classify(now(), ago(Duration::seconds(30))),
            AgentStatus::Online
        );
        assert_eq!(
            AgentStatus::classify(now(), ago(Duration::minutes(5))),
            AgentStatus::Idle
        );
        assert_eq!(
            AgentStatus::classify(now(), ago(Duration::minutes(29))),
            AgentStatus::Idle
        );
        assert_eq!(
            AgentStatus::classify(now(), ago(Duration::minutes(30))),
            AgentStatus::Offline
        );
    }

    #[test]
    fn future_timestamp_counts_as_online() {
        assert_eq!(
            AgentStatus::classify(now(), Some(now() + Duration::minutes(2))),
            AgentStatus::Online
        );
        assert_eq!(
            relative_time(now(), Some(now() + Duration::minutes(2))),
            "Just now"
        );
    }

    #[test]
    fn relative_time_buckets() {
        assert_eq!(relative_time(now(), None), "Never");
        assert_eq!(relative_time(now(), ago(Duration::seconds(59))), "Just now");
        assert_eq!(relative_time(now(), ago(Duration::minutes(1))), "1m ago");
        assert_eq!(relative_time(now(), ago(Duration::minutes(59))), "59m ago");
        assert_eq!(relative_time(now(), ago(Duration::hours(23))), "23h ago");
        assert_eq!(relative_time(now(), ago(Duration::days(6))), "6d ago");
        assert_eq!(relative_time(now(), ago(Duration::days(8))), "2024-05-02");
    }

    #[test]
    fn bucket_lower_bounds_are_inclusive() {
        assert_eq!(relative_time(now(), ago(Duration::minutes(60))), "1h ago");
        assert_eq!(relative_time(now(), ago(Duration::hours(24))), "1d ago");
        assert_eq!(relative_time(now(), ago(Duration::days(7))), "2024-05-03");
    }
}
