// Date expression parsing and display helpers

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate, TimeZone};

/// Parse a date expression into a timestamp at local midnight.
///
/// Supported expressions:
/// - `today`, `yesterday`, `tomorrow`
/// - `YYYY-MM-DD`
/// - `<N>d` - N days ago (e.g. `7d`)
pub fn parse_date_expr(expr: &str) -> Result<i64> {
    let expr = expr.trim().to_lowercase();
    let today = Local::now().date_naive();

    let date = match expr.as_str() {
        "today" => today,
        "yesterday" => today.pred_opt().ok_or_else(|| anyhow!("Date out of range"))?,
        "tomorrow" => today.succ_opt().ok_or_else(|| anyhow!("Date out of range"))?,
        _ => {
            if let Some(days_str) = expr.strip_suffix('d') {
                let days: i64 = days_str
                    .parse()
                    .map_err(|_| anyhow!("Invalid date expression: '{}'", expr))?;
                today
                    .checked_sub_days(chrono::Days::new(days as u64))
                    .ok_or_else(|| anyhow!("Date out of range: '{}'", expr))?
            } else {
                NaiveDate::parse_from_str(&expr, "%Y-%m-%d")
                    .map_err(|_| anyhow!("Invalid date expression: '{}'", expr))?
            }
        }
    };

    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Date out of range"))?;
    let ts = Local
        .from_local_datetime(&midnight)
        .single()
        .ok_or_else(|| anyhow!("Ambiguous local time for '{}'", expr))?
        .timestamp();
    Ok(ts)
}

/// Local calendar date of a timestamp.
pub fn local_date(ts: i64) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.with_timezone(&Local).date_naive())
}

/// Format a timestamp as a local date (e.g. "2026-08-06")
pub fn format_date(ts: i64) -> String {
    match chrono::DateTime::from_timestamp(ts, 0) {
        Some(dt) => dt.with_timezone(&Local).format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

/// Format a timestamp as relative age (e.g. "today", "3d ago")
pub fn format_relative_date(ts: i64) -> String {
    let today = Local::now().date_naive();
    let Some(date) = local_date(ts) else {
        return String::new();
    };
    let days = (today - date).num_days();
    match days {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        d if d > 1 => format!("{}d ago", d),
        d => format!("in {}d", -d),
    }
}

/// Format a timestamp as fine-grained relative time (e.g. "2h ago")
pub fn format_relative_time(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let diff = now - ts;

    if diff < 60 {
        format!("{}s ago", diff.max(0))
    } else if diff < 3600 {
        format!("{}m ago", diff / 60)
    } else if diff < 86400 {
        format!("{}h ago", diff / 3600)
    } else {
        format!("{}d ago", diff / 86400)
    }
}
