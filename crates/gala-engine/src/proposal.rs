//! Builds a field-level edit proposal from a classified intent.
//!
//! Proposed values come from the same extractors and resolver the
//! creation path uses, run against the edit message. Impact flags are a
//! pure function of which fields actually change, so the assessment is
//! reproducible for a fixed (event, message, now) triple.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use gala_core::{
    ChangeValidation, EditIntent, EditProposal, EventField, EventKind, EventRecord,
    OverallImpact, ProposedChange, Urgency,
};

use crate::config::ExtractionConfig;
use crate::datetime::{format_hm, has_date_expression, has_time_expression, resolve_date,
    resolve_time_range};
use crate::fields;

pub struct ProposalGenerator {
    config: ExtractionConfig,
}

impl ProposalGenerator {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Build a proposal for `intent` against an event snapshot. `now`
    /// anchors relative dates and the urgency window; it is threaded
    /// explicitly so the generator holds no ambient clock.
    pub fn generate(
        &self,
        intent: &EditIntent,
        event: &EventRecord,
        message: &str,
        now: DateTime<Utc>,
    ) -> EditProposal {
        let today = now.date_naive();
        let mut changes = Vec::new();

        for field in &intent.fields {
            if let Some(change) = self.propose_field(*field, event, message, today) {
                if !change.is_noop() {
                    changes.push(change);
                }
            }
        }

        // Keep the attendee cap consistent when the guest count grows past it.
        if let Some(guests) = changes
            .iter()
            .find(|c| c.field == EventField::ExpectedGuests)
            .and_then(|c| c.proposed_value.as_u64())
        {
            let guests = guests as u32;
            if guests > event.draft.max_attendees
                && !changes.iter().any(|c| c.field == EventField::MaxAttendees)
            {
                let cap = ((guests as f64 * self.config.attendee_headroom).round() as u32)
                    .max(self.config.attendee_floor);
                changes.push(ProposedChange {
                    field: EventField::MaxAttendees,
                    current_value: EventField::MaxAttendees.current_value(event),
                    proposed_value: cap.into(),
                    reasoning: format!(
                        "Raised the attendee limit to keep headroom above {guests} expected guests"
                    ),
                    validation: ChangeValidation::default(),
                });
            }
        }

        let impact = self.assess_impact(&changes, event, now);
        let (recommendations, risks) = self.advise(&impact);
        let summary = summarize(&changes);

        EditProposal {
            changes,
            summary,
            overall_impact: impact,
            recommendations,
            risks,
        }
    }

    fn propose_field(
        &self,
        field: EventField,
        event: &EventRecord,
        message: &str,
        today: NaiveDate,
    ) -> Option<ProposedChange> {
        let current_value = field.current_value(event);
        let (proposed_value, reasoning, warnings) = match field {
            EventField::Date => {
                if !has_date_expression(message) {
                    return None;
                }
                let date = resolve_date(message, today);
                let mut warnings = Vec::new();
                if date < today {
                    warnings.push(format!("{date} is in the past"));
                }
                (
                    date.to_string().into(),
                    format!("Moving the event from {} to {date}", event.draft.date),
                    warnings,
                )
            }
            EventField::Time => {
                let range = self.edit_time_range(event, message)?;
                let mut warnings = Vec::new();
                if let Some(warning) = self.venue_hours_warning(range.start) {
                    warnings.push(warning);
                }
                (
                    format_hm(range.start).into(),
                    format!(
                        "Changing the start from {} to {}",
                        event.draft.time,
                        format_hm(range.start)
                    ),
                    warnings,
                )
            }
            EventField::EndTime => {
                let range = self.edit_time_range(event, message)?;
                (
                    format_hm(range.end).into(),
                    format!(
                        "Changing the end from {} to {}",
                        event.draft.end_time,
                        format_hm(range.end)
                    ),
                    Vec::new(),
                )
            }
            EventField::Location => {
                if is_clearing_request(message) {
                    let warnings = if event.draft.address.is_empty() {
                        vec!["Location cleared without a replacement address".to_string()]
                    } else {
                        Vec::new()
                    };
                    (
                        "".into(),
                        "Clearing the venue as requested".to_string(),
                        warnings,
                    )
                } else {
                    let location = fields::extract_location(message)?;
                    (
                        location.clone().into(),
                        format!("Moving the event from {} to {location}", venue_label(event)),
                        Vec::new(),
                    )
                }
            }
            EventField::Address => {
                // No street-address extractor; the address follows the
                // venue through external lookup after the move.
                return None;
            }
            EventField::Description => {
                let description = span_after(message, &["description to", "description:"])?;
                (
                    description.into(),
                    "Rewriting the description as requested".to_string(),
                    Vec::new(),
                )
            }
            EventField::ExpectedGuests => {
                let guests = fields::extract_guest_count(message)?;
                (
                    guests.into(),
                    format!(
                        "Updating the guest count from {} to {guests}",
                        event.draft.expected_guests
                    ),
                    Vec::new(),
                )
            }
            EventField::MaxAttendees => return None,
            EventField::Budget => {
                let budget = fields::extract_budget(message)?;
                (
                    budget.into(),
                    format!("Setting the budget to ${budget}"),
                    Vec::new(),
                )
            }
            EventField::Price => {
                let price = fields::extract_price_explicit(message)?;
                (
                    price.clone().into(),
                    format!("Setting the ticket price to {price}"),
                    Vec::new(),
                )
            }
            EventField::Title => {
                let title = span_after(message, &["title to", "rename to", "call it"])?;
                (
                    title.clone().into(),
                    format!("Renaming the event to \"{title}\""),
                    Vec::new(),
                )
            }
            EventField::Notes => {
                let notes = fields::extract_notes(message)?;
                (
                    notes.into(),
                    "Updating the notes as requested".to_string(),
                    Vec::new(),
                )
            }
            EventField::Category => return None,
            EventField::Organizer => {
                let name = fields::extract_organizer(message)?;
                (
                    serde_json::json!({ "name": name, "image": "" }),
                    format!("Handing the event to {name}"),
                    Vec::new(),
                )
            }
            EventField::Schedule => {
                let range = self.edit_time_range(event, message)?;
                let kind: EventKind = event.draft.event_type.parse().unwrap_or(EventKind::Other);
                let day_label = event.draft.date.format("%A, %B %-d").to_string();
                let schedule =
                    fields::synthesize_schedule(kind, &day_label, range.start, range.end);
                (
                    serde_json::to_value(schedule).ok()?,
                    "Regenerating the schedule across the new time window".to_string(),
                    Vec::new(),
                )
            }
        };

        Some(ProposedChange {
            field,
            current_value,
            proposed_value,
            reasoning,
            validation: ChangeValidation { warnings },
        })
    }

    /// Resolve a time window from the edit message, anchored to the
    /// event's current start and duration so that a message with no time
    /// expression proposes nothing.
    fn edit_time_range(
        &self,
        event: &EventRecord,
        message: &str,
    ) -> Option<crate::datetime::TimeRange> {
        if !has_time_expression(message) {
            return None;
        }
        let current_start = NaiveTime::parse_from_str(&event.draft.time, "%H:%M").ok()?;
        let current_end = NaiveTime::parse_from_str(&event.draft.end_time, "%H:%M").ok()?;
        let duration_hours = (current_end.signed_duration_since(current_start).num_minutes()
            as f64
            / 60.0)
            .round()
            .max(1.0) as u32;
        Some(resolve_time_range(message, current_start, duration_hours))
    }

    fn venue_hours_warning(&self, start: NaiveTime) -> Option<String> {
        let opens = NaiveTime::parse_from_str(&self.config.venue_opens, "%H:%M").ok()?;
        let closes = NaiveTime::parse_from_str(&self.config.venue_closes, "%H:%M").ok()?;
        (start < opens || start > closes).then(|| {
            format!(
                "Start time {} is outside venue hours ({} - {})",
                format_hm(start),
                self.config.venue_opens,
                self.config.venue_closes
            )
        })
    }

    fn assess_impact(
        &self,
        changes: &[ProposedChange],
        event: &EventRecord,
        now: DateTime<Utc>,
    ) -> OverallImpact {
        let changed = |field: EventField| changes.iter().any(|c| c.field == field);

        let reschedule_required =
            changed(EventField::Date) || changed(EventField::Time) || changed(EventField::EndTime);
        let venue_change = changed(EventField::Location) || changed(EventField::Address);
        let cost_implication = changed(EventField::Budget) || changed(EventField::Price);
        let attendee_notification =
            reschedule_required || venue_change || changed(EventField::Description);

        let urgency = match event.start_datetime() {
            Some(start)
                if start - now.naive_utc()
                    <= Duration::hours(self.config.urgency_window_hours) =>
            {
                Urgency::High
            }
            _ => Urgency::Normal,
        };

        OverallImpact {
            attendee_notification,
            reschedule_required,
            venue_change,
            cost_implication,
            urgency,
        }
    }

    fn advise(&self, impact: &OverallImpact) -> (Vec<String>, Vec<String>) {
        let mut recommendations = Vec::new();
        let mut risks = Vec::new();

        if impact.reschedule_required {
            recommendations
                .push("Notify attendees about the new time as soon as the change is applied".into());
        }
        if impact.venue_change {
            recommendations.push("Update invitations and directions with the new venue".into());
            risks.push("Attendees who miss the update may go to the old venue".into());
        }
        if impact.cost_implication {
            recommendations.push("Review the event budget after applying this change".into());
        }
        if impact.attendee_notification && !impact.reschedule_required && !impact.venue_change {
            recommendations.push("Send an update notification to attendees".into());
        }
        if impact.urgency == Urgency::High {
            risks.push("Event starts within 48 hours — attendees have little time to react".into());
        }

        (recommendations, risks)
    }
}

fn summarize(changes: &[ProposedChange]) -> String {
    if changes.is_empty() {
        return "No concrete changes could be identified from the request".to_string();
    }
    let labels: Vec<&str> = changes.iter().map(|c| c.field.label()).collect();
    format!(
        "Proposed {} change{}: {}",
        changes.len(),
        if changes.len() == 1 { "" } else { "s" },
        labels.join(", ")
    )
}

fn venue_label(event: &EventRecord) -> &str {
    if event.draft.location.is_empty() {
        "(unset)"
    } else {
        &event.draft.location
    }
}

fn is_clearing_request(message: &str) -> bool {
    let lower = message.to_lowercase();
    (lower.contains("remove") || lower.contains("clear") || lower.contains("drop"))
        && (lower.contains("location") || lower.contains("venue"))
}

fn span_after(message: &str, markers: &[&str]) -> Option<String> {
    let lower = message.to_lowercase();
    for marker in markers {
        if let Some(pos) = lower.find(marker) {
            let span = message[pos + marker.len()..]
                .trim()
                .trim_matches('"')
                .trim_end_matches('.')
                .trim()
                .to_string();
            if !span.is_empty() {
                return Some(span);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit_intent::EditIntentAnalyzer;
    use gala_core::{EventDraft, Organizer};

    fn event_on(date: &str, time: &str, end: &str) -> EventRecord {
        EventRecord::from_draft(EventDraft {
            title: "Summer Gala".into(),
            event_type: "Party".into(),
            date: date.parse().unwrap(),
            time: time.into(),
            end_time: end.into(),
            location: "Riverside Pavilion".into(),
            address: String::new(),
            category: "Social".into(),
            description: "Annual fundraiser".into(),
            organizer: Organizer::named("Event Host"),
            price: "$25".into(),
            expected_guests: 60,
            max_attendees: 90,
            budget: Some(4000.0),
            notes: None,
            schedule: Vec::new(),
            attendees: Vec::new(),
            images: Vec::new(),
            image_hint: "party event".into(),
        })
    }

    fn generator() -> ProposalGenerator {
        ProposalGenerator::new(ExtractionConfig::default())
    }

    fn now() -> DateTime<Utc> {
        "2026-08-07T12:00:00Z".parse().unwrap()
    }

    fn propose(message: &str, event: &EventRecord) -> EditProposal {
        let intent = EditIntentAnalyzer::analyze(message, event);
        assert!(!intent.requires_clarification, "unexpected clarification");
        generator().generate(&intent, event, message, now())
    }

    #[test]
    fn time_change_sets_reschedule_and_notification() {
        let event = event_on("2026-09-12", "18:00", "22:00");
        let proposal = propose("move it to 9pm", &event);

        let time = proposal
            .changes
            .iter()
            .find(|c| c.field == EventField::Time)
            .unwrap();
        assert_eq!(time.proposed_value, serde_json::json!("21:00"));
        assert!(proposal.overall_impact.reschedule_required);
        assert!(proposal.overall_impact.attendee_notification);
        assert!(!proposal.overall_impact.venue_change);
        assert!(proposal
            .recommendations
            .iter()
            .any(|r| r.contains("Notify attendees")));
    }

    #[test]
    fn date_change_in_past_warns() {
        let event = event_on("2026-09-12", "18:00", "22:00");
        let proposal = propose("reschedule to 01/05/2026", &event);

        let date = proposal
            .changes
            .iter()
            .find(|c| c.field == EventField::Date)
            .unwrap();
        assert!(!date.validation.warnings.is_empty());

        // Date changes always imply a reschedule and a notification.
        assert!(proposal.overall_impact.reschedule_required);
        assert!(proposal.overall_impact.attendee_notification);
    }

    #[test]
    fn venue_change_flags_and_risk() {
        let event = event_on("2026-09-12", "18:00", "22:00");
        let proposal = propose("change the venue to Pier 9", &event);

        let location = proposal
            .changes
            .iter()
            .find(|c| c.field == EventField::Location)
            .unwrap();
        assert_eq!(location.proposed_value, serde_json::json!("Pier 9"));
        assert!(proposal.overall_impact.venue_change);
        assert!(proposal.overall_impact.attendee_notification);
        assert!(!proposal.overall_impact.reschedule_required);
        assert!(!proposal.risks.is_empty());
    }

    #[test]
    fn clearing_location_without_address_warns() {
        let event = event_on("2026-09-12", "18:00", "22:00");
        let proposal = propose("remove the location for now", &event);

        let location = proposal
            .changes
            .iter()
            .find(|c| c.field == EventField::Location)
            .unwrap();
        assert_eq!(location.proposed_value, serde_json::json!(""));
        assert!(location.validation.warnings[0].contains("without a replacement address"));
    }

    #[test]
    fn budget_change_is_cost_only() {
        let event = event_on("2026-09-12", "18:00", "22:00");
        let proposal = propose("raise the budget to $6000", &event);

        assert!(proposal.overall_impact.cost_implication);
        assert!(!proposal.overall_impact.reschedule_required);
        assert!(!proposal.overall_impact.attendee_notification);
        assert_eq!(proposal.overall_impact.urgency, Urgency::Normal);
    }

    #[test]
    fn imminent_event_is_high_urgency() {
        let event = event_on("2026-08-08", "18:00", "22:00");
        let proposal = propose("move it to 7pm", &event);
        assert_eq!(proposal.overall_impact.urgency, Urgency::High);
        assert!(proposal.risks.iter().any(|r| r.contains("48 hours")));
    }

    #[test]
    fn guest_growth_raises_attendee_cap() {
        let event = event_on("2026-09-12", "18:00", "22:00");
        let proposal = propose("expecting 120 guests now", &event);

        let cap = proposal
            .changes
            .iter()
            .find(|c| c.field == EventField::MaxAttendees)
            .unwrap();
        assert_eq!(cap.proposed_value, serde_json::json!(180));
    }

    #[test]
    fn late_night_start_warns_about_venue_hours() {
        let event = event_on("2026-09-12", "18:00", "22:00");
        let intent = EditIntentAnalyzer::analyze("move the start to 11:30pm", &event);
        let proposal = generator().generate(&intent, &event, "move the start to 11:30pm", now());

        let time = proposal
            .changes
            .iter()
            .find(|c| c.field == EventField::Time)
            .unwrap();
        assert!(time.validation.warnings[0].contains("venue hours"));
    }
}
