//! The post record shared by the parser and the merger.
//!
//! A [`Record`] is one post cut out of a source's posts file. Its metadata
//! and body are kept as the exact text found between the delimiters so the
//! merged document can re-emit them untouched; only the sort key is derived.

use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

static DATE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*date:[ \t]*(.*?)[ \t\r]*$").unwrap());

/// Layouts accepted for a `date:` value besides RFC 3339 and RFC 2822.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A single post, tagged with the source it came from.
///
/// ## Sorting
///
/// Use [`Record::newest_first`] with a stable sort: later sort keys come
/// first, equal keys keep their input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Display name of the owning source.
    pub source_name: String,

    /// Metadata block, trimmed of surrounding whitespace, otherwise verbatim.
    pub meta: String,

    /// Body block, trimmed. May be empty.
    pub body: String,

    /// The `date:` value as written (quotes and padding stripped).
    pub date: Option<String>,

    /// Derived from `date`; the undated sentinel when missing or unreadable.
    pub sort_key: DateTime<Utc>,
}

impl Record {
    /// Build a record from raw blocks. `undated` is the sort key used when
    /// the metadata has no usable date.
    pub fn new(source_name: &str, meta: &str, body: &str, undated: DateTime<Utc>) -> Self {
        let date = extract_date(meta);
        let sort_key = date.as_deref().and_then(parse_date).unwrap_or(undated);

        Self {
            source_name: source_name.to_string(),
            meta: meta.trim().to_string(),
            body: body.trim().to_string(),
            date,
            sort_key,
        }
    }

    /// Comparator for reverse-chronological order.
    pub fn newest_first(a: &Record, b: &Record) -> Ordering {
        b.sort_key.cmp(&a.sort_key)
    }
}

/// Find the first `date:` line and return its value without quotes.
pub fn extract_date(meta: &str) -> Option<String> {
    let caps = DATE_LINE_RE.captures(meta)?;
    let value = caps[1].trim().trim_matches(['"', '\'']).trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Interpret a date value as a UTC instant. Timezone-less values are UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.and_utc());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
