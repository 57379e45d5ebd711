//! Natural-language event extraction and edit-proposal engine.
//!
//! Two flows, both one-way:
//!
//! - creation: free text -> [`orchestrator::ExtractionOrchestrator`] ->
//!   [`gala_core::EventDraft`] (model path with deterministic heuristic
//!   fallback);
//! - editing: free text + event snapshot ->
//!   [`edit_intent::EditIntentAnalyzer`] ->
//!   [`proposal::ProposalGenerator`] -> [`apply::ChangeApplier`]
//!   (optimistic concurrency at apply time).

pub mod apply;
pub mod config;
pub mod datetime;
pub mod edit_intent;
pub mod engine;
pub mod fields;
pub mod heuristic;
pub mod llm;
pub mod orchestrator;
pub mod proposal;

pub use apply::ChangeApplier;
pub use config::{EngineConfig, ExtractionConfig, LlmConfig};
pub use edit_intent::EditIntentAnalyzer;
pub use engine::{EditOutcome, GalaEngine};
pub use heuristic::HeuristicExtractor;
pub use llm::{init_llm_provider, LlmProvider};
pub use orchestrator::{Extraction, ExtractionOrchestrator};
pub use proposal::ProposalGenerator;
