//! Canonicalizes relative and absolute date/time expressions.
//!
//! Rules are ordered literal tables, first match wins, and resolution
//! always produces a value — unresolvable text falls through to the
//! documented defaults rather than erroring.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use regex::Regex;

/// Relative keyword table: offset in days from the reference date.
/// Ordered longest-match-first so "day after tomorrow" wins over
/// "tomorrow" and "tomorrow" is never matched inside it.
const RELATIVE_DAYS: &[(&str, i64)] = &[
    ("day after tomorrow", 2),
    ("tomorrow", 1),
    ("today", 0),
    ("next week", 7),
    ("next month", 30),
];

const WEEKDAYS: &[(&str, Weekday)] = &[
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

/// Resolve a date expression against a reference date.
///
/// Priority: relative keywords, "next <weekday>", numeric `MM/DD/YYYY` or
/// `MM-DD-YYYY`, "<Month> <Day>" (rolled to next year if already past),
/// then the reference date itself. Never fails.
pub fn resolve_date(text: &str, reference: NaiveDate) -> NaiveDate {
    let lower = text.to_lowercase();

    for (keyword, offset) in RELATIVE_DAYS {
        if lower.contains(keyword) {
            return reference + Duration::days(*offset);
        }
    }

    for (name, weekday) in WEEKDAYS {
        if lower.contains(&format!("next {name}")) {
            return next_occurrence(reference, *weekday);
        }
    }

    let numeric = Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4})\b").expect("valid regex");
    if let Some(caps) = numeric.captures(&lower) {
        let month: u32 = caps[1].parse().unwrap_or(0);
        let day: u32 = caps[2].parse().unwrap_or(0);
        let year: i32 = caps[3].parse().unwrap_or(0);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return date;
        }
    }

    let month_day = Regex::new(
        r"\b(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sep|sept|oct|nov|dec)\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b",
    )
    .expect("valid regex");
    if let Some(caps) = month_day.captures(&lower) {
        let month = month_number(&caps[1]);
        let day: u32 = caps[2].parse().unwrap_or(0);
        if let Some(month) = month {
            if let Some(date) = NaiveDate::from_ymd_opt(reference.year(), month, day) {
                if date < reference {
                    if let Some(next_year) = NaiveDate::from_ymd_opt(reference.year() + 1, month, day)
                    {
                        return next_year;
                    }
                }
                return date;
            }
        }
    }

    reference
}

/// Nearest strictly-future occurrence of `weekday`: even when the
/// reference already falls on that weekday, the result is a week out.
fn next_occurrence(reference: NaiveDate, weekday: Weekday) -> NaiveDate {
    let today_idx = reference.weekday().num_days_from_sunday() as i64;
    let target_idx = weekday.num_days_from_sunday() as i64;
    let mut delta = (target_idx + 7 - today_idx) % 7;
    if delta == 0 {
        delta = 7;
    }
    reference + Duration::days(delta)
}

fn month_number(name: &str) -> Option<u32> {
    // Full names first, then the 3-letter prefixes used in casual text.
    MONTHS
        .iter()
        .find(|(full, _)| *full == name || full.starts_with(name))
        .map(|(_, n)| *n)
}

// ---------------------------------------------------------------------------
// Time resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Resolve a start/end time pair from free text.
///
/// Start priority: "at H(:MM)(am|pm)", "from H(:MM)(am|pm)", bare
/// "H(:MM)(am|pm)", "at HH(:MM)" 24-hour, then `default_start`. End:
/// explicit "for N hours" duration, else "to/until/till H(:MM)(am|pm)",
/// else start + `default_duration_hours`. An end that would cross
/// midnight clamps to 23:59 so start < end holds on the same date.
pub fn resolve_time_range(
    text: &str,
    default_start: NaiveTime,
    default_duration_hours: u32,
) -> TimeRange {
    let lower = text.to_lowercase();
    let start = resolve_start(&lower).unwrap_or(default_start);

    let duration_re = Regex::new(r"\bfor\s+(\d{1,2})\s+hours?\b").expect("valid regex");
    let end = if let Some(caps) = duration_re.captures(&lower) {
        let hours: i64 = caps[1].parse().unwrap_or(0);
        add_hours_clamped(start, hours)
    } else if let Some(end) = resolve_explicit_end(&lower) {
        if end > start {
            end
        } else {
            add_hours_clamped(start, default_duration_hours as i64)
        }
    } else {
        add_hours_clamped(start, default_duration_hours as i64)
    };

    TimeRange { start, end }
}

fn resolve_start(lower: &str) -> Option<NaiveTime> {
    let at_ampm = Regex::new(r"\bat\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").expect("valid regex");
    let from_ampm =
        Regex::new(r"\bfrom\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").expect("valid regex");
    let bare_ampm = Regex::new(r"\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").expect("valid regex");
    let at_24h = Regex::new(r"\bat\s+(\d{1,2})(?::(\d{2}))?\b").expect("valid regex");

    for re in [&at_ampm, &from_ampm, &bare_ampm] {
        if let Some(caps) = re.captures(lower) {
            let hour: u32 = caps[1].parse().ok()?;
            let minute: u32 = caps.get(2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
            return NaiveTime::from_hms_opt(to_24h(hour, &caps[3]), minute, 0);
        }
    }

    if let Some(caps) = at_24h.captures(lower) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps.get(2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        if hour < 24 && minute < 60 {
            return NaiveTime::from_hms_opt(hour, minute, 0);
        }
    }

    None
}

fn resolve_explicit_end(lower: &str) -> Option<NaiveTime> {
    let to_ampm = Regex::new(r"\b(?:to|until|till)\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b")
        .expect("valid regex");
    let caps = to_ampm.captures(lower)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps.get(2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    NaiveTime::from_hms_opt(to_24h(hour, &caps[3]), minute, 0)
}

fn to_24h(hour: u32, meridiem: &str) -> u32 {
    match (hour, meridiem) {
        (12, "am") => 0,
        (12, "pm") => 12,
        (h, "pm") => h + 12,
        (h, _) => h,
    }
}

pub(crate) fn add_hours_clamped(start: NaiveTime, hours: i64) -> NaiveTime {
    let total = start.signed_duration_since(NaiveTime::MIN).num_minutes() + hours * 60;
    if total >= 24 * 60 {
        NaiveTime::from_hms_opt(23, 59, 0).expect("valid time")
    } else {
        NaiveTime::MIN + Duration::minutes(total)
    }
}

/// 24-hour "HH:MM" used in event records.
pub fn format_hm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// "h:mm A" display form used in schedule items (e.g. "7:00 PM").
pub fn format_display(time: NaiveTime) -> String {
    // chrono's %l pads with a space; the product uses no padding.
    time.format("%-I:%M %p").to_string()
}

/// True when the text span itself reads as a time expression. Used to
/// reject time phrases captured by location patterns.
pub fn looks_like_time(text: &str) -> bool {
    let re = Regex::new(r"(?i)^\s*\d{1,2}(:\d{2})?\s*(am|pm)?\s*$").expect("valid regex");
    re.is_match(text)
}

/// True when the text contains any date expression the resolver would
/// act on. Distinguishes "move it to tomorrow" from a bare "change the
/// date", which names the field but carries no value.
pub fn has_date_expression(text: &str) -> bool {
    let lower = text.to_lowercase();
    if RELATIVE_DAYS.iter().any(|(k, _)| lower.contains(k)) {
        return true;
    }
    if WEEKDAYS
        .iter()
        .any(|(name, _)| lower.contains(&format!("next {name}")))
    {
        return true;
    }
    let numeric = Regex::new(r"\b\d{1,2}[/-]\d{1,2}[/-]\d{4}\b").expect("valid regex");
    if numeric.is_match(&lower) {
        return true;
    }
    let month_day = Regex::new(
        r"\b(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sep|sept|oct|nov|dec)\.?\s+\d{1,2}(st|nd|rd|th)?\b",
    )
    .expect("valid regex");
    month_day.is_match(&lower)
}

/// True when the text contains a start-time expression or an explicit
/// duration/end the resolver would act on.
pub fn has_time_expression(text: &str) -> bool {
    let lower = text.to_lowercase();
    if resolve_start(&lower).is_some() || resolve_explicit_end(&lower).is_some() {
        return true;
    }
    Regex::new(r"\bfor\s+\d{1,2}\s+hours?\b")
        .expect("valid regex")
        .is_match(&lower)
}
