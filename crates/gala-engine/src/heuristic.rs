//! Deterministic extraction path.
//!
//! Composes the field extractors and the date/time resolver into one
//! [`EventDraft`]. Never fails: any field the text does not resolve takes
//! its documented default, so the model path can always fall back here.

use chrono::{NaiveDate, NaiveTime};

use gala_core::{EventDraft, Organizer};

use crate::config::ExtractionConfig;
use crate::datetime::{format_hm, resolve_date, resolve_time_range};
use crate::fields;

pub struct HeuristicExtractor {
    config: ExtractionConfig,
}

impl HeuristicExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Attendee cap used when the text states no explicit limit.
    pub fn default_max_attendees(&self, expected_guests: u32) -> u32 {
        let scaled = (expected_guests as f64 * self.config.attendee_headroom).round() as u32;
        scaled.max(self.config.attendee_floor)
    }

    /// Extract a complete draft from free text. Deterministic for a fixed
    /// `(text, reference)` pair.
    pub fn extract(&self, text: &str, reference: NaiveDate) -> EventDraft {
        let kind = fields::classify_kind(text);
        let date = resolve_date(text, reference);

        let default_start = NaiveTime::parse_from_str(&self.config.default_start_time, "%H:%M")
            .unwrap_or_else(|_| NaiveTime::from_hms_opt(18, 0, 0).expect("valid time"));
        let times =
            resolve_time_range(text, default_start, self.config.default_duration_hours);

        let expected_guests =
            fields::extract_guest_count(text).unwrap_or(self.config.default_guests);

        let day_label = date.format("%A, %B %-d").to_string();

        EventDraft {
            title: fields::extract_title(text, kind),
            event_type: kind.label().to_string(),
            date,
            time: format_hm(times.start),
            end_time: format_hm(times.end),
            location: fields::extract_location(text).unwrap_or_default(),
            address: String::new(),
            category: kind.category().to_string(),
            description: text.trim().to_string(),
            organizer: Organizer::named(
                fields::extract_organizer(text).unwrap_or_else(|| "Event Host".to_string()),
            ),
            price: fields::extract_price(text),
            expected_guests,
            max_attendees: self.default_max_attendees(expected_guests),
            budget: fields::extract_budget(text),
            notes: fields::extract_notes(text),
            schedule: fields::synthesize_schedule(kind, &day_label, times.start, times.end),
            attendees: Vec::new(),
            images: Vec::new(),
            image_hint: fields::image_hint(kind),
        }
    }
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    const SCENARIO: &str =
        "Birthday party for Sam next Saturday at 7pm at Lakeview Hall for 25 guests, budget $500";

    fn reference() -> NaiveDate {
        // A Friday.
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn scenario_birthday_party() {
        let draft = HeuristicExtractor::default().extract(SCENARIO, reference());

        assert_eq!(draft.event_type, "Birthday Party");
        assert_eq!(draft.date.weekday(), Weekday::Sat);
        assert!(draft.date > reference());
        assert_eq!(draft.time, "19:00");
        assert_eq!(draft.end_time, "21:00");
        assert_eq!(draft.location, "Lakeview Hall");
        assert_eq!(draft.expected_guests, 25);
        assert_eq!(draft.budget, Some(500.0));
        assert!(draft.max_attendees >= 38);
        assert_eq!(draft.category, "Celebration");
    }

    #[test]
    fn extraction_is_idempotent() {
        let extractor = HeuristicExtractor::default();
        let a = extractor.extract(SCENARIO, reference());
        let b = extractor.extract(SCENARIO, reference());
        assert_eq!(a, b);
    }

    #[test]
    fn bare_text_takes_all_defaults() {
        let draft = HeuristicExtractor::default().extract("let's do something", reference());
        assert_eq!(draft.event_type, "Other");
        assert_eq!(draft.date, reference());
        assert_eq!(draft.time, "18:00");
        assert_eq!(draft.end_time, "20:00");
        assert_eq!(draft.expected_guests, 10);
        assert_eq!(draft.max_attendees, 20);
        assert_eq!(draft.budget, None);
        assert_eq!(draft.notes, None);
        assert_eq!(draft.organizer.name, "Event Host");
        assert_eq!(draft.price, "$0");
        assert!(draft.attendees.is_empty());
        assert!(draft.images.is_empty());
    }

    #[test]
    fn max_attendees_floor_and_headroom() {
        let extractor = HeuristicExtractor::default();
        assert_eq!(extractor.default_max_attendees(10), 20);
        assert_eq!(extractor.default_max_attendees(25), 38);
        assert_eq!(extractor.default_max_attendees(100), 150);
        assert_eq!(extractor.default_max_attendees(0), 20);
    }

    #[test]
    fn generated_schedule_spans_event_window() {
        let draft = HeuristicExtractor::default().extract(SCENARIO, reference());
        let start = NaiveTime::parse_from_str(&draft.time, "%H:%M").unwrap();
        let end = NaiveTime::parse_from_str(&draft.end_time, "%H:%M").unwrap();
        assert_eq!(draft.schedule.len(), 1);
        for item in &draft.schedule[0].items {
            let t = NaiveTime::parse_from_str(&item.time, "%I:%M %p").unwrap();
            assert!(t >= start && t <= end);
        }
    }
}
