use async_trait::async_trait;
use uuid::Uuid;

use crate::error::GalaResult;
use crate::model::EventRecord;

/// Persisted document store for events. The engine only ever reads a
/// snapshot and writes a full record back; partial-update semantics live
/// in the applier, which merges into the snapshot before calling `update`.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: &EventRecord) -> GalaResult<()>;
    async fn get(&self, id: Uuid) -> GalaResult<Option<EventRecord>>;
    async fn update(&self, event: &EventRecord) -> GalaResult<()>;
    async fn delete(&self, id: Uuid) -> GalaResult<bool>;
    async fn list(&self, limit: usize, offset: usize) -> GalaResult<Vec<EventRecord>>;
}

/// Best-effort log of extraction exchanges, kept for future model tuning.
/// Implementations must tolerate being called fire-and-forget; a failed
/// append is the caller's to ignore.
#[async_trait]
pub trait ConversationLog: Send + Sync {
    async fn append(&self, user_text: &str, ai_text: &str) -> GalaResult<()>;
}

fn _assert_event_store_object_safe(_: &dyn EventStore) {}
fn _assert_conversation_log_object_safe(_: &dyn ConversationLog) {}
