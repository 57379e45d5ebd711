use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EventField;

// ---------------------------------------------------------------------------
// Edit intent
// ---------------------------------------------------------------------------

/// Classification of a free-form edit request against an existing event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditIntent {
    /// Fields the request targets, in trigger-table order.
    pub fields: Vec<EventField>,
    pub requires_clarification: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarification_question: Option<String>,
}

impl EditIntent {
    pub fn clear(fields: Vec<EventField>) -> Self {
        Self {
            fields,
            requires_clarification: false,
            clarification_question: None,
        }
    }

    pub fn ambiguous(fields: Vec<EventField>, question: impl Into<String>) -> Self {
        Self {
            fields,
            requires_clarification: true,
            clarification_question: Some(question.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Edit proposal
// ---------------------------------------------------------------------------

/// Non-fatal findings attached to a single proposed change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeValidation {
    pub warnings: Vec<String>,
}

/// One field-level change with its rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedChange {
    pub field: EventField,
    pub current_value: serde_json::Value,
    pub proposed_value: serde_json::Value,
    pub reasoning: String,
    #[serde(default)]
    pub validation: ChangeValidation,
}

impl ProposedChange {
    pub fn is_noop(&self) -> bool {
        self.current_value == self.proposed_value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Normal,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

/// Derived flags describing what accepting a proposal would entail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallImpact {
    pub attendee_notification: bool,
    pub reschedule_required: bool,
    pub venue_change: bool,
    pub cost_implication: bool,
    pub urgency: Urgency,
}

/// Structured diff + impact assessment for a requested edit, not yet
/// applied. Consumed exactly once by the change applier, or discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProposal {
    pub changes: Vec<ProposedChange>,
    pub summary: String,
    pub overall_impact: OverallImpact,
    pub recommendations: Vec<String>,
    pub risks: Vec<String>,
}

// ---------------------------------------------------------------------------
// Apply result
// ---------------------------------------------------------------------------

/// Outcome of successfully applying an accepted proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedResult {
    pub event_id: Uuid,
    pub applied_fields: Vec<EventField>,
    pub summary: String,
}
