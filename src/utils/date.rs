// src/utils/date.rs

//! Publication date parsing.
//!
//! Catalog dates come in a handful of literal shapes. Each is tried in order
//! and the first that yields a real calendar date wins. Results are midnight
//! in Japan Standard Time.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use regex::Regex;

const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Accepted formats, in order of attempt. Bare years map to January 1.
static DATE_FORMATS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(\d{4})(\d{2})(\d{2})$",
        r"^(\d{4})-(\d{1,2})-(\d{1,2})$",
        r"^(\d{4})年(\d{1,2})月(\d{1,2})日$",
        r"^(\d{4})$",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Japan Standard Time (UTC+9).
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current time in JST.
pub fn now_jst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&jst())
}

/// Parse a publication date string. Empty or unrecognized input yields `None`.
pub fn parse_pubdate(raw: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS.iter().find_map(|re| {
        let caps = re.captures(raw)?;
        let year = caps.get(1)?.as_str().parse().ok()?;
        let month = caps.get(2).map_or(Some(1), |m| m.as_str().parse().ok())?;
        let day = caps.get(3).map_or(Some(1), |m| m.as_str().parse().ok())?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        jst()
            .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
            .single()
    })
}

/// Render a date as `YYYY年MM月DD日`.
pub fn format_japanese(date: &DateTime<FixedOffset>) -> String {
    date.format("%Y年%m月%d日").to_string()
}
