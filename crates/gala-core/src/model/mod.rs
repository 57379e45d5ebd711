pub mod proposal;
pub use proposal::*;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Event Kind
// ---------------------------------------------------------------------------

/// Resolved event type. Serialized as its display label ("Birthday Party")
/// because that is the string the document store and the model prompt use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BirthdayParty,
    Wedding,
    Meeting,
    Meal,
    Party,
    Concert,
    Workshop,
    Trip,
    Festival,
    Exhibition,
    Other,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BirthdayParty => "Birthday Party",
            Self::Wedding => "Wedding",
            Self::Meeting => "Meeting",
            Self::Meal => "Meal",
            Self::Party => "Party",
            Self::Concert => "Concert",
            Self::Workshop => "Workshop",
            Self::Trip => "Trip",
            Self::Festival => "Festival",
            Self::Exhibition => "Exhibition",
            Self::Other => "Other",
        }
    }

    /// Fixed category map keyed by resolved type.
    pub fn category(&self) -> &'static str {
        match self {
            Self::BirthdayParty | Self::Wedding => "Celebration",
            Self::Party => "Social",
            Self::Meeting => "Business",
            Self::Meal => "Food & Drink",
            Self::Concert | Self::Festival => "Entertainment",
            Self::Workshop => "Education",
            Self::Trip => "Travel",
            Self::Exhibition => "Arts & Culture",
            Self::Other => "Miscellaneous",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Birthday Party" => Ok(Self::BirthdayParty),
            "Wedding" => Ok(Self::Wedding),
            "Meeting" => Ok(Self::Meeting),
            "Meal" => Ok(Self::Meal),
            "Party" => Ok(Self::Party),
            "Concert" => Ok(Self::Concert),
            "Workshop" => Ok(Self::Workshop),
            "Trip" => Ok(Self::Trip),
            "Festival" => Ok(Self::Festival),
            "Exhibition" => Ok(Self::Exhibition),
            "Other" => Ok(Self::Other),
            other => Err(format!("unknown event kind: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Event Draft
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organizer {
    pub name: String,
    #[serde(default)]
    pub image: String,
}

impl Organizer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    /// Display time, "h:mm A" (e.g. "7:00 PM").
    pub time: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub day: String,
    pub items: Vec<ScheduleItem>,
}

/// Structured event produced by extraction, not yet persisted.
///
/// Transient: created per extraction call, either persisted by the caller
/// as an [`EventRecord`] or discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// ISO-8601 calendar date.
    pub date: NaiveDate,
    /// 24-hour "HH:MM".
    pub time: String,
    /// 24-hour "HH:MM", strictly after `time` unless an explicit duration
    /// made them equal.
    pub end_time: String,
    pub location: String,
    #[serde(default)]
    pub address: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub organizer: Organizer,
    pub price: String,
    pub expected_guests: u32,
    pub max_attendees: u32,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub schedule: Vec<ScheduleDay>,
    /// Always empty at creation; managed by the store.
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Populated by the external upload service, never by extraction.
    #[serde(default)]
    pub images: Vec<String>,
    /// Search hint for the external image service, derived from the type.
    #[serde(default)]
    pub image_hint: String,
}

// ---------------------------------------------------------------------------
// Persisted Event
// ---------------------------------------------------------------------------

/// An event as held by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub draft: EventDraft,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventRecord {
    pub fn from_draft(draft: EventDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            draft,
            created_at: now,
            updated_at: now,
        }
    }

    /// Event start as a naive timestamp (the product stores wall-clock
    /// venue time without a zone).
    pub fn start_datetime(&self) -> Option<NaiveDateTime> {
        let time = NaiveTime::parse_from_str(&self.draft.time, "%H:%M").ok()?;
        Some(self.draft.date.and_time(time))
    }
}

// ---------------------------------------------------------------------------
// Event Field
// ---------------------------------------------------------------------------

/// Every event field an edit proposal can target. `as_str` yields the wire
/// (camelCase) name used in proposals and the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventField {
    Title,
    Date,
    Time,
    EndTime,
    Location,
    Address,
    Description,
    Category,
    Budget,
    Price,
    ExpectedGuests,
    MaxAttendees,
    Notes,
    Organizer,
    Schedule,
}

impl EventField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Date => "date",
            Self::Time => "time",
            Self::EndTime => "endTime",
            Self::Location => "location",
            Self::Address => "address",
            Self::Description => "description",
            Self::Category => "category",
            Self::Budget => "budget",
            Self::Price => "price",
            Self::ExpectedGuests => "expectedGuests",
            Self::MaxAttendees => "maxAttendees",
            Self::Notes => "notes",
            Self::Organizer => "organizer",
            Self::Schedule => "schedule",
        }
    }

    /// Human-readable label for summaries and clarification questions.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Date => "date",
            Self::Time => "start time",
            Self::EndTime => "end time",
            Self::Location => "location",
            Self::Address => "address",
            Self::Description => "description",
            Self::Category => "category",
            Self::Budget => "budget",
            Self::Price => "ticket price",
            Self::ExpectedGuests => "expected guest count",
            Self::MaxAttendees => "attendee limit",
            Self::Notes => "notes",
            Self::Organizer => "organizer",
            Self::Schedule => "schedule",
        }
    }

    /// Read the field's live value off an event as JSON.
    pub fn current_value(&self, event: &EventRecord) -> serde_json::Value {
        let d = &event.draft;
        match self {
            Self::Title => d.title.clone().into(),
            Self::Date => d.date.to_string().into(),
            Self::Time => d.time.clone().into(),
            Self::EndTime => d.end_time.clone().into(),
            Self::Location => d.location.clone().into(),
            Self::Address => d.address.clone().into(),
            Self::Description => d.description.clone().into(),
            Self::Category => d.category.clone().into(),
            Self::Budget => d
                .budget
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
            Self::Price => d.price.clone().into(),
            Self::ExpectedGuests => d.expected_guests.into(),
            Self::MaxAttendees => d.max_attendees.into(),
            Self::Notes => d
                .notes
                .clone()
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
            Self::Organizer => serde_json::to_value(&d.organizer)
                .unwrap_or(serde_json::Value::Null),
            Self::Schedule => serde_json::to_value(&d.schedule)
                .unwrap_or(serde_json::Value::Null),
        }
    }

    /// Write a proposed JSON value back onto an event.
    pub fn apply_to(
        &self,
        event: &mut EventRecord,
        value: &serde_json::Value,
    ) -> crate::GalaResult<()> {
        let invalid = || {
            crate::GalaError::InvalidInput(format!(
                "value {value} is not valid for field '{}'",
                self.as_str()
            ))
        };
        let d = &mut event.draft;
        match self {
            Self::Title => d.title = value.as_str().ok_or_else(invalid)?.to_string(),
            Self::Date => {
                let raw = value.as_str().ok_or_else(invalid)?;
                d.date = raw.parse().map_err(|_| invalid())?;
            }
            Self::Time => d.time = value.as_str().ok_or_else(invalid)?.to_string(),
            Self::EndTime => d.end_time = value.as_str().ok_or_else(invalid)?.to_string(),
            Self::Location => d.location = value.as_str().ok_or_else(invalid)?.to_string(),
            Self::Address => d.address = value.as_str().ok_or_else(invalid)?.to_string(),
            Self::Description => {
                d.description = value.as_str().ok_or_else(invalid)?.to_string()
            }
            Self::Category => d.category = value.as_str().ok_or_else(invalid)?.to_string(),
            Self::Budget => {
                d.budget = match value {
                    serde_json::Value::Null => None,
                    other => Some(other.as_f64().ok_or_else(invalid)?),
                }
            }
            Self::Price => d.price = value.as_str().ok_or_else(invalid)?.to_string(),
            Self::ExpectedGuests => {
                d.expected_guests = value.as_u64().ok_or_else(invalid)? as u32
            }
            Self::MaxAttendees => {
                d.max_attendees = value.as_u64().ok_or_else(invalid)? as u32
            }
            Self::Notes => {
                d.notes = match value {
                    serde_json::Value::Null => None,
                    other => Some(other.as_str().ok_or_else(invalid)?.to_string()),
                }
            }
            Self::Organizer => {
                d.organizer = serde_json::from_value(value.clone()).map_err(|_| invalid())?
            }
            Self::Schedule => {
                d.schedule = serde_json::from_value(value.clone()).map_err(|_| invalid())?
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for EventField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One prior turn of the extraction conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Which path produced an extraction result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Model,
    Heuristic,
}
