//! Per-field extractors over free-form event text.
//!
//! Each extractor is a pure function of the text, independent of the
//! others, driven by a small ordered table of keyword/regex rules where
//! the first match wins. The tables are kept literal so behavior stays
//! reproducible and testable without reference to any matching library.

use chrono::NaiveTime;
use regex::Regex;

use gala_core::{EventKind, ScheduleDay, ScheduleItem};

use crate::datetime::{format_display, looks_like_time};

// ---------------------------------------------------------------------------
// Type classification
// ---------------------------------------------------------------------------

/// Keyword -> type table. Ordered: "birthday party" must classify as a
/// birthday, so "birthday" precedes "party".
const KIND_KEYWORDS: &[(&str, EventKind)] = &[
    ("birthday", EventKind::BirthdayParty),
    ("wedding", EventKind::Wedding),
    ("meeting", EventKind::Meeting),
    ("conference", EventKind::Meeting),
    ("sync", EventKind::Meeting),
    ("dinner", EventKind::Meal),
    ("lunch", EventKind::Meal),
    ("meal", EventKind::Meal),
    ("party", EventKind::Party),
    ("celebration", EventKind::Party),
    ("concert", EventKind::Concert),
    ("show", EventKind::Concert),
    ("workshop", EventKind::Workshop),
    ("seminar", EventKind::Workshop),
    ("trip", EventKind::Trip),
    ("vacation", EventKind::Trip),
    ("festival", EventKind::Festival),
    ("exhibition", EventKind::Exhibition),
    ("expo", EventKind::Exhibition),
];

pub fn classify_kind(text: &str) -> EventKind {
    let lower = text.to_lowercase();
    for (keyword, kind) in KIND_KEYWORDS {
        if lower.contains(keyword) {
            return *kind;
        }
    }
    EventKind::Other
}

// ---------------------------------------------------------------------------
// Title
// ---------------------------------------------------------------------------

pub fn extract_title(text: &str, kind: EventKind) -> String {
    if let Some(span) = span_after_for(text) {
        if span.chars().count() >= 3 {
            return span;
        }
    }

    // Proper-noun fallback: "for Sam", "of Priya", "with Jordan".
    let proper = Regex::new(r"\b(?:for|of|with)\s+([A-Z][a-z]+)\b").expect("valid regex");
    if let Some(caps) = proper.captures(text) {
        return format!("{} for {}", kind.label(), &caps[1]);
    }

    kind.label().to_string()
}

fn span_after_for(text: &str) -> Option<String> {
    let marker = Regex::new(r"(?i)\bfor\s+").expect("valid regex");
    let stops = Regex::new(r"(?i) at | on | in |\. ").expect("valid regex");

    let rest = &text[marker.find(text)?.end()..];
    let cut = stops.find(rest).map_or(rest.len(), |m| m.start());
    let span = rest[..cut]
        .trim()
        .trim_end_matches(['.', ','])
        .trim()
        .to_string();
    (!span.is_empty()).then_some(span)
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

pub fn extract_location(text: &str) -> Option<String> {
    // Prepositional markers, most specific first. Every occurrence of a
    // marker is tried: "at 7pm at Lakeview Hall" must skip the time phrase
    // and still find the venue. The "to" variants cover edit requests
    // ("change the location to Pier 9").
    let markers = [
        r"(?i)\b(?:location|venue|place)\s+(?:is|to)\s+",
        r"(?i)\bat\s+",
        r"(?i)\bin\s+",
    ];

    for marker in markers {
        let re = Regex::new(marker).expect("valid regex");
        for m in re.find_iter(text) {
            let candidate = truncate_location(&text[m.end()..]);
            if candidate.is_empty() || looks_like_time(&candidate) {
                continue;
            }
            return Some(candidate);
        }
    }
    None
}

fn truncate_location(span: &str) -> String {
    // A venue name ends at punctuation, a time phrase, or a trailing
    // clause like "for 25 guests".
    let stops = Regex::new(r"(?i),|\.| for | on | at | from | to | until | till | with ")
        .expect("valid regex");
    let cut = stops.find(span).map_or(span.len(), |m| m.start());
    span[..cut].trim().to_string()
}

// ---------------------------------------------------------------------------
// Numbers: guests, budget, price
// ---------------------------------------------------------------------------

pub fn extract_guest_count(text: &str) -> Option<u32> {
    let lower = text.to_lowercase();
    let rules = [
        r"(\d+)\s+(?:people|guests|attendees|participants|friends|family members)\b",
        r"\b(?:people|guests|attendees|participants)\s*:\s*(\d+)",
        r"\b(?:expecting|invite)\s+(\d+)\b",
        r"\b(?:guests?|attendees?|people|capacity|headcount)\s+to\s+(\d+)\b",
    ];
    for rule in rules {
        let re = Regex::new(rule).expect("valid regex");
        if let Some(caps) = re.captures(&lower) {
            if let Ok(n) = caps[1].parse() {
                return Some(n);
            }
        }
    }
    None
}

pub fn extract_budget(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    let re = Regex::new(r"\b(?:budget|cost|spending)\s*(?:of|is|to|:)?\s*\$?(\d+)")
        .expect("valid regex");
    let caps = re.captures(&lower)?;
    caps[1].parse::<f64>().ok().filter(|n| *n >= 0.0)
}

/// Price only when the text states one; `None` otherwise.
pub fn extract_price_explicit(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let re = Regex::new(r"\b(?:price|cost|fee)\s*(?:is|to|:)?\s*\$(\d+)").expect("valid regex");
    if let Some(caps) = re.captures(&lower) {
        return Some(format!("${}", &caps[1]));
    }
    lower.contains("free").then(|| "Free".to_string())
}

pub fn extract_price(text: &str) -> String {
    extract_price_explicit(text).unwrap_or_else(|| "$0".to_string())
}

// ---------------------------------------------------------------------------
// Notes and organizer
// ---------------------------------------------------------------------------

pub fn extract_notes(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)\b(?:note|remember|don'?t forget|bring)\b:?\s*(.+)")
        .expect("valid regex");
    let caps = re.captures(text)?;
    let span = caps[1]
        .split([',', '.'])
        .next()
        .unwrap_or("")
        .trim()
        .to_string();
    (!span.is_empty()).then_some(span)
}

pub fn extract_organizer(text: &str) -> Option<String> {
    let marker =
        Regex::new(r"(?i)\b(?:organized by|hosted by|organizer is)\s+").expect("valid regex");
    let m = marker.find(text)?;
    // Take the run of capitalized words after the marker: "Maria Lopez".
    let name: String = text[m.end()..]
        .split([',', '.'])
        .next()
        .unwrap_or("")
        .split_whitespace()
        .take_while(|w| w.chars().next().is_some_and(|c| c.is_uppercase()))
        .collect::<Vec<_>>()
        .join(" ");
    (!name.is_empty()).then_some(name)
}

// ---------------------------------------------------------------------------
// Schedule synthesis
// ---------------------------------------------------------------------------

/// Activity-name template per type. Items are spread evenly across the
/// event window: item `i` of `n` lands at `start + i/(n-1) * duration`.
fn activity_template(kind: EventKind, duration_minutes: i64) -> Vec<&'static str> {
    match kind {
        EventKind::BirthdayParty => vec!["Arrival", "Food & Drinks", "Cake Cutting"],
        EventKind::Meeting => vec!["Start", "Discussion", "Wrap-up"],
        EventKind::Wedding => vec!["Ceremony", "Reception", "Dinner", "Dancing"],
        _ => {
            if duration_minutes >= 120 {
                vec!["Start", "Main Activity", "End"]
            } else {
                vec!["Start", "End"]
            }
        }
    }
}

pub fn synthesize_schedule(
    kind: EventKind,
    day_label: &str,
    start: NaiveTime,
    end: NaiveTime,
) -> Vec<ScheduleDay> {
    let duration = end.signed_duration_since(start).num_minutes().max(0);
    let names = activity_template(kind, duration);
    let slots = (names.len() - 1).max(1) as i64;

    let items = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let offset = duration * i as i64 / slots;
            ScheduleItem {
                time: format_display(start + chrono::Duration::minutes(offset)),
                title: (*name).to_string(),
            }
        })
        .collect();

    vec![ScheduleDay {
        day: day_label.to_string(),
        items,
    }]
}

/// Image-search hint for the external image service.
pub fn image_hint(kind: EventKind) -> String {
    format!("{} event", kind.label().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_table_first_match_wins() {
        assert_eq!(classify_kind("birthday party for Sam"), EventKind::BirthdayParty);
        assert_eq!(classify_kind("a big celebration"), EventKind::Party);
        assert_eq!(classify_kind("quarterly sync with the team"), EventKind::Meeting);
        assert_eq!(classify_kind("photography expo downtown"), EventKind::Exhibition);
        assert_eq!(classify_kind("just hanging out"), EventKind::Other);
    }

    #[test]
    fn title_span_after_for() {
        let title = extract_title(
            "Birthday party for Sam next Saturday at 7pm",
            EventKind::BirthdayParty,
        );
        assert_eq!(title, "Sam next Saturday");
    }

    #[test]
    fn title_proper_noun_fallback() {
        // Span after "for" is under 3 characters, so the proper-noun rule
        // kicks in.
        let title = extract_title("dinner for Al at the bistro", EventKind::Meal);
        assert_eq!(title, "Meal for Al");
    }

    #[test]
    fn title_falls_back_to_kind() {
        assert_eq!(
            extract_title("wedding next June", EventKind::Wedding),
            "Wedding"
        );
    }

    #[test]
    fn location_skips_time_phrases() {
        let location = extract_location("party at 7pm at Lakeview Hall for 25 guests");
        assert_eq!(location.as_deref(), Some("Lakeview Hall"));
    }

    #[test]
    fn location_truncates_at_comma() {
        let location = extract_location("dinner at The Blue Door, please bring wine");
        assert_eq!(location.as_deref(), Some("The Blue Door"));
    }

    #[test]
    fn location_explicit_marker() {
        let location = extract_location("location is Grand Ballroom. Doors open early");
        assert_eq!(location.as_deref(), Some("Grand Ballroom"));
    }

    #[test]
    fn location_absent() {
        assert_eq!(extract_location("a quiet evening"), None);
    }

    #[test]
    fn guest_count_forms() {
        assert_eq!(extract_guest_count("25 guests"), Some(25));
        assert_eq!(extract_guest_count("guests: 40"), Some(40));
        assert_eq!(extract_guest_count("expecting 12"), Some(12));
        assert_eq!(extract_guest_count("3 family members"), Some(3));
        assert_eq!(extract_guest_count("no numbers here"), None);
    }

    #[test]
    fn budget_forms() {
        assert_eq!(extract_budget("budget $500"), Some(500.0));
        assert_eq!(extract_budget("budget of 1200"), Some(1200.0));
        assert_eq!(extract_budget("spending: $75"), Some(75.0));
        assert_eq!(extract_budget("no money talk"), None);
    }

    #[test]
    fn price_forms() {
        assert_eq!(extract_price("price is $50"), "$50");
        assert_eq!(extract_price("entry is free"), "Free");
        assert_eq!(extract_price("nothing stated"), "$0");
    }

    #[test]
    fn notes_span() {
        assert_eq!(
            extract_notes("party at 8. Don't forget the cake, it matters").as_deref(),
            Some("the cake")
        );
        assert_eq!(
            extract_notes("bring your own chair. thanks").as_deref(),
            Some("your own chair")
        );
        assert_eq!(extract_notes("plain text"), None);
    }

    #[test]
    fn organizer_proper_name() {
        assert_eq!(
            extract_organizer("gala hosted by Maria Lopez, 8pm").as_deref(),
            Some("Maria Lopez")
        );
        assert_eq!(
            extract_organizer("Organized by Sam at the hall").as_deref(),
            Some("Sam")
        );
        assert_eq!(extract_organizer("no host named"), None);
    }

    #[test]
    fn schedule_meeting_midpoint() {
        let start = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let days = synthesize_schedule(EventKind::Meeting, "Day 1", start, end);
        assert_eq!(days.len(), 1);
        let items = &days[0].items;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].time, "10:00 AM");
        assert_eq!(items[1].time, "11:00 AM");
        assert_eq!(items[1].title, "Discussion");
        assert_eq!(items[2].time, "12:00 PM");
    }

    #[test]
    fn schedule_short_default_skips_midpoint() {
        let start = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(19, 0, 0).unwrap();
        let days = synthesize_schedule(EventKind::Other, "Day 1", start, end);
        let titles: Vec<_> = days[0].items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Start", "End"]);
    }

    #[test]
    fn schedule_times_stay_in_window() {
        let start = NaiveTime::from_hms_opt(19, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(21, 0, 0).unwrap();
        for day in synthesize_schedule(EventKind::Wedding, "Day 1", start, end) {
            for item in &day.items {
                let t = NaiveTime::parse_from_str(&item.time, "%I:%M %p").unwrap();
                assert!(t >= start && t <= end, "{} outside window", item.time);
            }
        }
    }
}
