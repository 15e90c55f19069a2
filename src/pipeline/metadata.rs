//! Metadata extraction from free-form Markdown.
//!
//! Documents carry their title, version, client and date in whatever layout
//! the author chose: a front-matter table, bold inline labels, or prose.
//! Each field is therefore an ordered list of independent matchers; the
//! first one that yields a value wins. Adding a layout means appending a
//! matcher, never editing an existing one.
//!
//! Extraction never fails. Every field has a default.

use crate::output::DocumentMetadata;
use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

const DEFAULT_TITLE: &str = "Document";
const DEFAULT_VERSION: &str = "1.0";

/// Day used when a date names only the month and year.
const MID_MONTH_DAY: &str = "15";

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// ── Title & version ──────────────────────────────────────────────────────

static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#\s+(.+?)$").unwrap());

static RE_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*Version\s+(.+?)\*\*").unwrap());

// ── Client name ──────────────────────────────────────────────────────────

static RE_CLIENT_PREPARED_FOR_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*\*\*Prepared For\*\*\s*\|\s*([^\n<|]+)").unwrap());

static RE_CLIENT_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*\*\*Client\*\*\s*\|\s*([^\n<|]+)").unwrap());

static RE_CLIENT_INLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\*\*Client:\*\*\s*(.+?)$").unwrap());

// Name stays on its own line: horizontal whitespace only.
static RE_CLIENT_PROSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Prepared [Ff]or:?[ \t]*\*?\*?([A-Z][a-zA-Z \t']+)").unwrap());

static CLIENT_MATCHERS: [&Lazy<Regex>; 4] = [
    &RE_CLIENT_PREPARED_FOR_ROW,
    &RE_CLIENT_ROW,
    &RE_CLIENT_INLINE,
    &RE_CLIENT_PROSE,
];

static RE_ASTERISKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*+").unwrap());

static RE_HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

// ── Date ─────────────────────────────────────────────────────────────────

static RE_DATE_DOCUMENTATION_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*\*\*Documentation Date\*\*\s*\|\s*([^\n|]+)").unwrap());

static RE_DATE_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*\*\*Date\*\*\s*\|\s*([^\n|]+)").unwrap());

static RE_DATE_INLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)\*\*Date:\*\*\s*(.+?)$").unwrap());

static DATE_MATCHERS: [&Lazy<Regex>; 3] = [&RE_DATE_DOCUMENTATION_ROW, &RE_DATE_ROW, &RE_DATE_INLINE];

static RE_MONTH_DAY_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"((?-u:\w)+)\s+([0-9]+),?\s+([0-9]{4})").unwrap());

static RE_MONTH_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"((?-u:\w)+)\s+([0-9]{4})").unwrap());

/// Extract metadata, defaulting the date to today's UTC date.
pub fn extract(content: &str) -> DocumentMetadata {
    extract_at(content, Utc::now().date_naive())
}

/// Extract metadata with an explicit "today" for the date fallback.
pub fn extract_at(content: &str, today: NaiveDate) -> DocumentMetadata {
    DocumentMetadata {
        title: extract_title(content).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        version: extract_version(content).unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        client_name: extract_client_name(content).unwrap_or_default(),
        date_str: extract_date(content).unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
    }
}

fn first_capture(re: &Regex, content: &str) -> Option<String> {
    re.captures(content).map(|caps| caps[1].to_string())
}

fn extract_title(content: &str) -> Option<String> {
    first_capture(&RE_TITLE, content)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn extract_version(content: &str) -> Option<String> {
    first_capture(&RE_VERSION, content).map(|v| v.trim().to_string())
}

fn extract_client_name(content: &str) -> Option<String> {
    CLIENT_MATCHERS
        .iter()
        .find_map(|re| first_capture(re, content))
        .map(|raw| clean_client_name(&raw))
}

fn clean_client_name(raw: &str) -> String {
    let s = RE_ASTERISKS.replace_all(raw.trim(), "");
    let s = RE_HTML_TAG.replace_all(&s, "");
    s.trim().to_string()
}

/// Try each date matcher in order; a match that does not normalise falls
/// through to the next matcher.
fn extract_date(content: &str) -> Option<String> {
    DATE_MATCHERS
        .iter()
        .filter_map(|re| first_capture(re, content))
        .find_map(|text| normalize_date(&text))
}

/// `"December 15, 2025"` → `2025-12-15`; `"December 2025"` → `2025-12-15`.
fn normalize_date(text: &str) -> Option<String> {
    if let Some(caps) = RE_MONTH_DAY_YEAR.captures(text) {
        if let Some(month) = month_number(&caps[1]) {
            return Some(format!("{}-{:02}-{:0>2}", &caps[3], month, &caps[2]));
        }
    }
    let caps = RE_MONTH_YEAR.captures(text)?;
    let month = month_number(&caps[1])?;
    Some(format!("{}-{:02}-{}", &caps[2], month, MID_MONTH_DAY))
}

fn month_number(name: &str) -> Option<usize> {
    MONTHS.iter().position(|m| *m == name).map(|i| i + 1)
}
