//! Extraction orchestration: model path first, heuristic path always.
//!
//! The model path is a chain of explicit outcomes — completion, JSON
//! parse, normalization — and any failed link routes the whole call to
//! the deterministic extractor. Extraction therefore never returns an
//! error, only a draft tagged with the path that produced it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::{debug, warn};

use gala_core::{
    ChatRole, ChatTurn, ConversationLog, EventDraft, ExtractionSource, Organizer, ScheduleDay,
};

use crate::config::EngineConfig;
use crate::datetime::{format_hm, resolve_date};
use crate::heuristic::HeuristicExtractor;
use crate::llm::{ChatMessage, CompletionParams, LlmProvider};

/// Result of one extraction call.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub draft: EventDraft,
    /// Human-readable confirmation, fixed template.
    pub ai_message: String,
    pub source: ExtractionSource,
}

/// Why the model path was abandoned for the heuristic path. Never
/// surfaced to callers; used for logging and tests.
#[derive(Debug)]
enum ModelPathError {
    NotConfigured,
    Unavailable(crate::llm::LlmError),
    Malformed(String),
}

pub struct ExtractionOrchestrator {
    heuristic: HeuristicExtractor,
    llm: Option<Arc<dyn LlmProvider>>,
    log: Option<Arc<dyn ConversationLog>>,
    timeout: Duration,
}

impl ExtractionOrchestrator {
    pub fn new(config: &EngineConfig, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self {
            heuristic: HeuristicExtractor::new(config.extraction.clone()),
            llm,
            log: None,
            timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }

    pub fn with_conversation_log(mut self, log: Option<Arc<dyn ConversationLog>>) -> Self {
        self.log = log;
        self
    }

    /// Extract an event draft from free text, with optional prior turns.
    ///
    /// `reference` anchors relative dates ("tomorrow", "next saturday");
    /// it is threaded explicitly so calls share no ambient clock.
    pub async fn extract(
        &self,
        text: &str,
        history: &[ChatTurn],
        reference: NaiveDate,
    ) -> Extraction {
        let (draft, source) = match self.model_draft(text, history, reference).await {
            Ok(draft) => (draft, ExtractionSource::Model),
            Err(ModelPathError::NotConfigured) => {
                debug!("no LLM provider configured, using heuristic extraction");
                (self.heuristic.extract(text, reference), ExtractionSource::Heuristic)
            }
            Err(ModelPathError::Unavailable(err)) => {
                warn!(error = %err, "model unavailable, falling back to heuristic extraction");
                (self.heuristic.extract(text, reference), ExtractionSource::Heuristic)
            }
            Err(ModelPathError::Malformed(reason)) => {
                warn!(reason = %reason, "model output unusable, falling back to heuristic extraction");
                (self.heuristic.extract(text, reference), ExtractionSource::Heuristic)
            }
        };

        let ai_message = build_ai_message(&draft);

        // Fire-and-forget: training-data capture must never block or fail
        // the extraction response.
        if let Some(log) = &self.log {
            let log = Arc::clone(log);
            let user_text = text.to_string();
            let assistant_text = ai_message.clone();
            tokio::spawn(async move {
                if let Err(err) = log.append(&user_text, &assistant_text).await {
                    debug!(error = %err, "conversation log append failed");
                }
            });
        }

        Extraction {
            draft,
            ai_message,
            source,
        }
    }

    async fn model_draft(
        &self,
        text: &str,
        history: &[ChatTurn],
        reference: NaiveDate,
    ) -> Result<EventDraft, ModelPathError> {
        let llm = self.llm.as_ref().ok_or(ModelPathError::NotConfigured)?;

        let messages = build_prompt(text, history, reference);
        let params = CompletionParams {
            temperature: Some(0.1),
            ..CompletionParams::default()
        };

        let raw = match tokio::time::timeout(self.timeout, llm.complete(&messages, &params)).await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => return Err(ModelPathError::Unavailable(err)),
            Err(_) => return Err(ModelPathError::Unavailable(crate::llm::LlmError::Timeout)),
        };

        let parsed = parse_model_json(&raw)
            .ok_or_else(|| ModelPathError::Malformed("no JSON object in completion".into()))?;

        Ok(self.normalize(parsed, text, reference))
    }

    /// Overlay a lenient model draft onto the heuristic baseline so the
    /// result always satisfies the draft invariants, whatever the model
    /// omitted or mangled.
    fn normalize(&self, model: ModelDraft, text: &str, reference: NaiveDate) -> EventDraft {
        let mut draft = self.heuristic.extract(text, reference);

        if let Some(title) = non_empty(model.title) {
            draft.title = title;
        }
        if let Some(event_type) = non_empty(model.event_type) {
            draft.event_type = event_type;
        }
        if let Some(raw) = non_empty(model.date) {
            // The prompt asks for ISO; models sometimes echo the user's
            // phrasing instead, so re-resolve anything non-ISO.
            draft.date = raw
                .parse::<NaiveDate>()
                .unwrap_or_else(|_| resolve_date(&raw, reference));
        }
        if let Some(time) = parse_hm(model.time) {
            draft.time = format_hm(time);
        }
        if let Some(end) = parse_hm(model.end_time) {
            if format_hm(end) > draft.time {
                draft.end_time = format_hm(end);
            }
        }
        if draft.end_time <= draft.time {
            // The model moved the start past the recorded end; restore the
            // default duration from the new start.
            if let Ok(start) = NaiveTime::parse_from_str(&draft.time, "%H:%M") {
                draft.end_time = format_hm(crate::datetime::add_hours_clamped(
                    start,
                    self.heuristic.config().default_duration_hours as i64,
                ));
            }
        }
        if let Some(location) = non_empty(model.location) {
            draft.location = location;
        }
        if let Some(address) = non_empty(model.address) {
            draft.address = address;
        }
        if let Some(category) = non_empty(model.category) {
            draft.category = category;
        }
        if let Some(description) = non_empty(model.description) {
            draft.description = description;
        }
        if let Some(name) = model.organizer.and_then(organizer_name) {
            draft.organizer = Organizer::named(name);
        }
        if let Some(price) = model.price.and_then(price_string) {
            draft.price = price;
        }
        if let Some(guests) = model.expected_guests.and_then(as_u32) {
            draft.expected_guests = guests;
            draft.max_attendees = self.heuristic.default_max_attendees(guests);
        }
        if let Some(max) = model.max_attendees.and_then(as_u32) {
            if max >= draft.expected_guests {
                draft.max_attendees = max;
            }
        }
        if let Some(budget) = model.budget.and_then(|v| v.as_f64()) {
            if budget >= 0.0 {
                draft.budget = Some(budget);
            }
        }
        if let Some(notes) = non_empty(model.notes) {
            draft.notes = Some(notes);
        }
        if let Some(schedule) = model.schedule {
            if let Ok(schedule) = serde_json::from_value::<Vec<ScheduleDay>>(schedule) {
                if !schedule.is_empty() {
                    draft.schedule = schedule;
                }
            }
        }

        draft
    }
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

const SCHEMA_SAMPLE: &str = r#"{
  "title": "Birthday Party for Sam",
  "type": "Birthday Party",
  "date": "2025-06-14",
  "time": "19:00",
  "endTime": "21:00",
  "location": "Lakeview Hall",
  "address": "",
  "category": "Celebration",
  "description": "",
  "organizer": {"name": "Event Host", "image": ""},
  "price": "Free",
  "expectedGuests": 25,
  "maxAttendees": 38,
  "budget": 500,
  "notes": null,
  "schedule": [{"day": "Saturday, June 14", "items": [{"time": "7:00 PM", "title": "Arrival"}]}]
}"#;

fn build_prompt(text: &str, history: &[ChatTurn], reference: NaiveDate) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(format!(
        "You are a strict JSON generator for an event planning product. \
         Extract one event from the user's description. Only output valid JSON, \
         no extra text, exactly matching this schema:\n{SCHEMA_SAMPLE}\n\
         Today's date is {reference}. Resolve relative dates against it. \
         Times are 24-hour \"HH:MM\". Use null for unknown budget and notes."
    ))];

    for turn in history {
        messages.push(match turn.role {
            ChatRole::User => ChatMessage::user(turn.content.clone()),
            ChatRole::Assistant => ChatMessage::assistant(turn.content.clone()),
        });
    }

    messages.push(ChatMessage::user(text.to_string()));
    messages
}

// ---------------------------------------------------------------------------
// Model output parsing
// ---------------------------------------------------------------------------

/// Lenient mirror of the draft schema: every field optional, numeric
/// fields tolerated as strings, organizer tolerated as a bare name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ModelDraft {
    title: Option<String>,
    #[serde(rename = "type")]
    event_type: Option<String>,
    date: Option<String>,
    time: Option<String>,
    end_time: Option<String>,
    location: Option<String>,
    address: Option<String>,
    category: Option<String>,
    description: Option<String>,
    organizer: Option<serde_json::Value>,
    price: Option<serde_json::Value>,
    expected_guests: Option<serde_json::Value>,
    max_attendees: Option<serde_json::Value>,
    budget: Option<serde_json::Value>,
    notes: Option<String>,
    schedule: Option<serde_json::Value>,
}

fn parse_model_json(raw: &str) -> Option<ModelDraft> {
    let trimmed = raw.trim();
    if let Ok(draft) = serde_json::from_str(trimmed) {
        return Some(draft);
    }

    // Completions often wrap the object in prose or a code fence; salvage
    // the first balanced object.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_hm(value: Option<String>) -> Option<NaiveTime> {
    let raw = non_empty(value)?;
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%I:%M %p"))
        .ok()
}

fn organizer_name(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(name) => {
            let name = name.trim().to_string();
            (!name.is_empty()).then_some(name)
        }
        serde_json::Value::Object(map) => map
            .get("name")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn price_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => {
            let s = s.trim().to_string();
            (!s.is_empty()).then_some(s)
        }
        serde_json::Value::Number(n) => {
            let amount = n.as_f64().unwrap_or(0.0);
            Some(if amount == 0.0 {
                "Free".to_string()
            } else {
                format!("${amount}")
            })
        }
        _ => None,
    }
}

fn as_u32(value: serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map(|n| n as u32),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Summary message
// ---------------------------------------------------------------------------

/// Fixed confirmation template. Required lines always present, in order;
/// optional lines appended only when the field carries a value.
pub fn build_ai_message(draft: &EventDraft) -> String {
    let location = if draft.location.is_empty() {
        "TBD"
    } else {
        &draft.location
    };

    let mut lines = vec![
        "Here's the event I put together:".to_string(),
        String::new(),
        format!("🎉 **Title:** {}", draft.title),
        format!("📅 **Date:** {}", draft.date),
        format!("🕐 **Time:** {} - {}", draft.time, draft.end_time),
        format!("📍 **Location:** {location}"),
        format!("👥 **Expected Guests:** {}", draft.expected_guests),
    ];

    if !draft.category.is_empty() {
        lines.push(format!("🏷️ **Category:** {}", draft.category));
    }
    if !draft.organizer.name.is_empty() {
        lines.push(format!("👤 **Organizer:** {}", draft.organizer.name));
    }
    if !draft.price.is_empty() {
        lines.push(format!("💵 **Price:** {}", draft.price));
    }
    if let Some(budget) = draft.budget {
        lines.push(format!("💰 **Budget:** ${budget}"));
    }
    if let Some(notes) = draft.notes.as_deref().filter(|n| !n.is_empty()) {
        lines.push(format!("📝 **Notes:** {notes}"));
    }
    if !draft.schedule.is_empty() {
        lines.push("🗓️ **Schedule:**".to_string());
        for day in &draft.schedule {
            for item in &day.items {
                lines.push(format!("  - {}: {}", item.time, item.title));
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salvages_fenced_json() {
        let raw = "Sure! Here is the event:\n```json\n{\"title\": \"Picnic\", \"expectedGuests\": \"15\"}\n```";
        let parsed = parse_model_json(raw).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Picnic"));
        assert_eq!(parsed.expected_guests.and_then(as_u32), Some(15));
    }

    #[test]
    fn rejects_non_json() {
        assert!(parse_model_json("I cannot help with that.").is_none());
        assert!(parse_model_json("").is_none());
    }

    #[test]
    fn organizer_accepts_both_shapes() {
        assert_eq!(
            organizer_name(serde_json::json!("Maria")).as_deref(),
            Some("Maria")
        );
        assert_eq!(
            organizer_name(serde_json::json!({"name": "Sam", "image": ""})).as_deref(),
            Some("Sam")
        );
        assert_eq!(organizer_name(serde_json::json!(17)), None);
    }

    #[test]
    fn message_required_lines_in_order() {
        let draft = HeuristicExtractor::default().extract(
            "Birthday party for Sam next Saturday at 7pm at Lakeview Hall for 25 guests",
            chrono::NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
        );
        let message = build_ai_message(&draft);

        let title = message.find("**Title:**").unwrap();
        let date = message.find("**Date:**").unwrap();
        let time = message.find("**Time:**").unwrap();
        let location = message.find("**Location:**").unwrap();
        let guests = message.find("**Expected Guests:**").unwrap();
        assert!(title < date && date < time && time < location && location < guests);
        assert!(message.contains("19:00 - 21:00"));
        assert!(message.contains("Lakeview Hall"));
    }

    #[test]
    fn message_omits_absent_optionals() {
        let mut draft = HeuristicExtractor::default()
            .extract("something casual", chrono::NaiveDate::from_ymd_opt(2026, 8, 7).unwrap());
        draft.budget = None;
        draft.notes = None;
        draft.schedule.clear();
        let message = build_ai_message(&draft);
        assert!(!message.contains("**Budget:**"));
        assert!(!message.contains("**Notes:**"));
        assert!(!message.contains("**Schedule:**"));
    }
}
