use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::fixture::MatchDate;

const MONTHS: [(&str, &str); 12] = [
    ("jan", "01"),
    ("feb", "02"),
    ("mar", "03"),
    ("apr", "04"),
    ("may", "05"),
    ("jun", "06"),
    ("jul", "07"),
    ("aug", "08"),
    ("sep", "09"),
    ("oct", "10"),
    ("nov", "11"),
    ("dec", "12"),
];

// Tried in order; the first layout that consumes the whole input wins.
// Two-digit years go before four-digit ones so "01/09/23" never lands in year 23.
const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%d/%m/%y", "%d/%m/%Y", "%a %d %b %Y", "%d %b %Y"];

const PLACEHOLDER: &str = "TBC";

static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})[:.](\d{2})").expect("valid clock time regex"));

static CLOCK_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}[:.]\d{2}\b").expect("valid clock token regex"));

static SCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*[-:]\s*(\d+)").expect("valid score regex"));

// Full or abbreviated names only, so words like "Maryhill" or "Sunderland"
// never start a date.
static WEEKDAY_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(mon(?:day)?|tue(?:s(?:day)?)?|wed(?:nesday)?|thu(?:r(?:s(?:day)?)?)?|fri(?:day)?|sat(?:urday)?|sun(?:day)?)\.?,?\s+(\d{1,2})(?:st|nd|rd|th)?\s+(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b",
    )
    .expect("valid weekday date regex")
});

static MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+(\d{1,2})\b",
    )
    .expect("valid month day regex")
});

static ISO_DATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})[T ]").expect("valid iso prefix regex"));

/// Two-digit month for a month name, matched on its first three letters.
///
/// Unknown names fall back to `"01"`; callers that need to tell the
/// difference use [`month_number`].
pub fn month_name_to_number(text: &str) -> &'static str {
    lookup_month(text).unwrap_or("01")
}

pub fn month_number(text: &str) -> Option<u32> {
    lookup_month(text).and_then(|m| m.parse().ok())
}

fn lookup_month(text: &str) -> Option<&'static str> {
    let key = text.trim().get(..3)?.to_ascii_lowercase();
    MONTHS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, number)| *number)
}

/// First `H:MM` / `HH.MM` looking token, normalized to `HH:MM`.
pub fn parse_clock_time(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(PLACEHOLDER) {
        return None;
    }
    let caps = CLOCK_TIME.captures(trimmed)?;
    let hour = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let minute = caps.get(2)?.as_str();
    Some(format!("{hour:02}:{minute}"))
}

/// First pair of integers separated by `-` or `:`.
pub fn parse_score(text: &str) -> Option<(u32, u32)> {
    let caps = SCORE.captures(text)?;
    let home = caps.get(1)?.as_str().parse().ok()?;
    let away = caps.get(2)?.as_str().parse().ok()?;
    Some((home, away))
}

/// Parse a free-form date against the known layouts.
///
/// Empty and `TBC` inputs are absent. Anything no layout accepts comes back
/// as [`MatchDate::Unparsed`] carrying the original text.
pub fn parse_generic_date(text: &str) -> Option<MatchDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(PLACEHOLDER) {
        return None;
    }

    let candidate = ISO_DATE_PREFIX
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    for layout in DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(candidate, layout) {
            return Some(MatchDate::Calendar(date));
        }
    }
    Some(MatchDate::Unparsed(trimmed.to_string()))
}

/// Day/month tokens recovered from a date signature such as `Sun, 02 Sep`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParts {
    pub weekday: Option<String>,
    pub day: u32,
    pub month: u32,
    /// Byte offset of the signature in the searched text.
    pub offset: usize,
}

/// Every date signature in `text`, in order of appearance.
///
/// The weekday form wins; the bare `Sep 2` form is only consulted when the
/// text holds no weekday form at all.
pub fn find_date_parts(text: &str) -> Vec<DateParts> {
    let weekday: Vec<DateParts> = WEEKDAY_DATE
        .captures_iter(text)
        .filter_map(|caps| {
            Some(DateParts {
                weekday: Some(caps.get(1)?.as_str().to_string()),
                day: caps.get(2)?.as_str().parse().ok()?,
                month: month_number(caps.get(3)?.as_str())?,
                offset: caps.get(0)?.start(),
            })
        })
        .collect();
    if !weekday.is_empty() {
        return weekday;
    }
    MONTH_DAY
        .captures_iter(text)
        .filter_map(|caps| {
            Some(DateParts {
                weekday: None,
                day: caps.get(2)?.as_str().parse().ok()?,
                month: month_number(caps.get(1)?.as_str())?,
                offset: caps.get(0)?.start(),
            })
        })
        .collect()
}

pub fn has_date_signature(text: &str) -> bool {
    WEEKDAY_DATE.is_match(text) || MONTH_DAY.is_match(text)
}

/// Drop date signatures and clock times so they cannot be read as team
/// names or scores.
pub fn strip_date_noise(text: &str) -> String {
    let without_dates = WEEKDAY_DATE.replace_all(text, " ");
    let without_times = CLOCK_TOKEN.replace_all(&without_dates, " ");
    normalize_ws(&without_times)
}

/// Collapse runs of whitespace (including `&nbsp;` leftovers) to single spaces.
pub fn normalize_ws(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
