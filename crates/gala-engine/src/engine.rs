//! Composition root: wires config, store, and the optional model provider
//! into the extraction and edit flows.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use gala_core::{
    AppliedResult, ChatTurn, ConversationLog, EditProposal, EventDraft, EventRecord, EventStore,
    GalaError, GalaResult,
};

use crate::apply::ChangeApplier;
use crate::config::EngineConfig;
use crate::edit_intent::EditIntentAnalyzer;
use crate::llm::LlmProvider;
use crate::orchestrator::{Extraction, ExtractionOrchestrator};
use crate::proposal::ProposalGenerator;

/// Outcome of an edit request: either a proposal ready for review, or a
/// clarification question when the request was ambiguous. Ambiguity is a
/// conversation turn, not an error.
#[derive(Debug, Clone)]
pub enum EditOutcome {
    NeedsClarification { question: String },
    Proposal(EditProposal),
}

pub struct GalaEngine {
    config: EngineConfig,
    store: Arc<dyn EventStore>,
    llm: Option<Arc<dyn LlmProvider>>,
    log: Option<Arc<dyn ConversationLog>>,
}

impl GalaEngine {
    pub fn new(config: EngineConfig, store: Arc<dyn EventStore>) -> Self {
        Self {
            config,
            store,
            llm: None,
            log: None,
        }
    }

    pub fn with_llm(mut self, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_conversation_log(mut self, log: Option<Arc<dyn ConversationLog>>) -> Self {
        self.log = log;
        self
    }

    fn orchestrator(&self) -> ExtractionOrchestrator {
        ExtractionOrchestrator::new(&self.config, self.llm.clone())
            .with_conversation_log(self.log.clone())
    }

    // ── Creation flow ──────────────────────────────────────────────────

    /// Extract a draft from free text. Never fails; the worst case is a
    /// fully-defaulted heuristic draft.
    pub async fn extract_event(
        &self,
        text: &str,
        history: &[ChatTurn],
        reference: NaiveDate,
    ) -> Extraction {
        self.orchestrator().extract(text, history, reference).await
    }

    /// Persist a draft as a new event record.
    pub async fn create_event(&self, draft: EventDraft) -> GalaResult<EventRecord> {
        let record = EventRecord::from_draft(draft);
        self.store.insert(&record).await?;
        Ok(record)
    }

    pub async fn get_event(&self, id: Uuid) -> GalaResult<EventRecord> {
        self.store
            .get(id)
            .await?
            .ok_or(GalaError::EventNotFound(id))
    }

    // ── Edit flow ──────────────────────────────────────────────────────

    /// Analyze an edit request against the live event and, when it is
    /// unambiguous, produce a reviewed proposal.
    pub async fn propose_edit(
        &self,
        event_id: Uuid,
        message: &str,
        now: DateTime<Utc>,
    ) -> GalaResult<EditOutcome> {
        let event = self.get_event(event_id).await?;
        let intent = EditIntentAnalyzer::analyze(message, &event);

        if intent.requires_clarification {
            let question = intent
                .clarification_question
                .unwrap_or_else(|| "What would you like to change?".to_string());
            return Ok(EditOutcome::NeedsClarification { question });
        }

        let generator = ProposalGenerator::new(self.config.extraction.clone());
        Ok(EditOutcome::Proposal(
            generator.generate(&intent, &event, message, now),
        ))
    }

    /// Apply an accepted proposal. Fails with `ConcurrentModification`
    /// when the snapshot the proposal was built against has gone stale.
    pub async fn apply_edit(
        &self,
        event_id: Uuid,
        proposal: &EditProposal,
        actor_id: &str,
    ) -> GalaResult<AppliedResult> {
        ChangeApplier::new(Arc::clone(&self.store))
            .apply(event_id, proposal, actor_id)
            .await
    }
}
