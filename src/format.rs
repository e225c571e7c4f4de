use chrono::{DateTime, Utc};

/// Human-readable age of `then` relative to `now`.
///
/// Whole units only, largest first: days, then hours, then minutes. Anything
/// under a minute, or in the future, is "just now".
pub fn relative_age(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);

    let days = elapsed.num_days();
    if days > 0 {
        return plural(days, "day");
    }
    let hours = elapsed.num_hours();
    if hours > 0 {
        return plural(hours, "hour");
    }
    let minutes = elapsed.num_minutes();
    if minutes > 0 {
        return plural(minutes, "minute");
    }
    "just now".to_string()
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Notice sent to the recipient right before the forwarded message
pub fn match_header(keywords: &[String], age: &str) -> String {
    format!("🔥 Keyword match: {} ({})", keywords.join(", "), age)
}
