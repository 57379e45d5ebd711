//! Classifies a free-form edit request against an existing event.
//!
//! A fixed trigger table maps keyword categories to event fields. A
//! request that names no category, or names several without carrying a
//! concrete value for any of them, needs clarification — surfaced as a
//! question, never as an error.

use gala_core::{EditIntent, EventField, EventRecord};

use crate::datetime::{has_date_expression, has_time_expression};
use crate::fields;

struct Trigger {
    /// Human label used in clarification questions.
    label: &'static str,
    keywords: &'static [&'static str],
    fields: &'static [EventField],
}

/// Category trigger table, checked in order. Matching is case-insensitive
/// substring over the whole message, like the rest of the rule tables.
const TRIGGERS: &[Trigger] = &[
    Trigger {
        label: "schedule",
        keywords: &["schedule", "agenda", "itinerary", "activities"],
        fields: &[EventField::Schedule],
    },
    Trigger {
        label: "date or time",
        keywords: &[
            "time", "date", "day", "when", "reschedule", "postpone", "earlier", "later",
            "tomorrow", "tonight",
        ],
        fields: &[EventField::Date, EventField::Time, EventField::EndTime],
    },
    Trigger {
        label: "location",
        keywords: &["location", "venue", "place", "where", "address"],
        fields: &[EventField::Location, EventField::Address],
    },
    Trigger {
        label: "description",
        keywords: &["description", "details", "about section"],
        fields: &[EventField::Description],
    },
    Trigger {
        label: "guest count",
        keywords: &["guest", "attendee", "people", "capacity", "headcount"],
        fields: &[EventField::ExpectedGuests, EventField::MaxAttendees],
    },
    Trigger {
        label: "budget",
        keywords: &["budget", "spending"],
        fields: &[EventField::Budget],
    },
    Trigger {
        label: "ticket price",
        keywords: &["price", "ticket", "fee", "cost", "free"],
        fields: &[EventField::Price],
    },
    Trigger {
        label: "title",
        keywords: &["title", "rename", "call it"],
        fields: &[EventField::Title],
    },
    Trigger {
        label: "notes",
        keywords: &["note", "reminder"],
        fields: &[EventField::Notes],
    },
];

pub struct EditIntentAnalyzer;

impl EditIntentAnalyzer {
    /// Classify `message` against an event snapshot.
    pub fn analyze(message: &str, _event: &EventRecord) -> EditIntent {
        let lower = message.to_lowercase();

        let matched: Vec<&Trigger> = TRIGGERS
            .iter()
            .filter(|t| {
                if t.keywords.iter().any(|k| lower.contains(k)) {
                    return true;
                }
                // A bare date/time expression ("move it to 9pm") names the
                // category even without a keyword.
                t.label == "date or time"
                    && (has_date_expression(message) || has_time_expression(message))
            })
            .collect();

        match matched.len() {
            0 => EditIntent::ambiguous(
                Vec::new(),
                "I wasn't sure what you'd like to change. You can update the date, time, \
                 location, guest count, budget, ticket price, title, notes, description, \
                 or schedule — which should I adjust?",
            ),
            1 => EditIntent::clear(matched[0].fields.to_vec()),
            _ => {
                let concrete: Vec<&&Trigger> = matched
                    .iter()
                    .filter(|t| Self::has_concrete_value(t, message))
                    .collect();

                if concrete.is_empty() {
                    let labels: Vec<&str> = matched.iter().map(|t| t.label).collect();
                    let (head, last) = labels.split_at(labels.len() - 1);
                    EditIntent::ambiguous(
                        collect_fields(&matched),
                        format!(
                            "That could affect the {} or the {} — which did you mean, and \
                             what should the new value be?",
                            head.join(", the "),
                            last[0]
                        ),
                    )
                } else {
                    let fields = concrete
                        .iter()
                        .flat_map(|t| t.fields.iter().copied())
                        .collect();
                    EditIntent::clear(dedup(fields))
                }
            }
        }
    }

    /// Whether the message carries an extractable value for the category,
    /// not just its name.
    fn has_concrete_value(trigger: &Trigger, message: &str) -> bool {
        match trigger.label {
            "date or time" => has_date_expression(message) || has_time_expression(message),
            "schedule" => has_time_expression(message),
            "location" => fields::extract_location(message).is_some(),
            "guest count" => fields::extract_guest_count(message).is_some(),
            "budget" => fields::extract_budget(message).is_some(),
            "ticket price" => fields::extract_price_explicit(message).is_some(),
            "notes" => fields::extract_notes(message).is_some(),
            "description" | "title" => {
                // "set the title to X" / "description: X" style.
                let lower = message.to_lowercase();
                lower.contains(" to ") || lower.contains(':')
            }
            _ => false,
        }
    }
}

fn collect_fields(triggers: &[&Trigger]) -> Vec<EventField> {
    dedup(
        triggers
            .iter()
            .flat_map(|t| t.fields.iter().copied())
            .collect(),
    )
}

fn dedup(fields: Vec<EventField>) -> Vec<EventField> {
    let mut seen = std::collections::HashSet::new();
    fields.into_iter().filter(|f| seen.insert(*f)).collect()
}
