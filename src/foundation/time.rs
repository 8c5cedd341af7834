use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Current instant as an RFC 3339 string with millisecond precision, e.g. `2026-10-18T09:30:00.123Z`.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Compact, filename-safe stamp for `at`, e.g. `20261018093000123`.
pub fn file_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S%3f").to_string()
}

/// Parse a manifest timestamp. Accepts RFC 3339 and naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Milliseconds since the epoch, `0` for missing or unparseable input.
pub fn sort_millis(raw: Option<&str>) -> i64 {
    raw.and_then(parse_timestamp)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// Human display form (`18/10/2026 09:30`). Unparseable input is shown as-is.
pub fn human(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    Some(match parse_timestamp(raw) {
        Some(dt) => dt.format("%d/%m/%Y %H:%M").to_string(),
        None => raw.to_string(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/time.rs"]
mod tests;
