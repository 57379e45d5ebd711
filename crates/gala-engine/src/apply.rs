//! Applies an accepted proposal with optimistic concurrency.
//!
//! No lock is held between analysis and apply. The applier re-fetches the
//! live event and compares every change's recorded current value against
//! it; any drift means another writer got there first and the whole
//! analyze -> propose -> apply sequence must be re-run on a fresh
//! snapshot.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use gala_core::{AppliedResult, EditProposal, EventStore, GalaError, GalaResult};

pub struct ChangeApplier {
    store: Arc<dyn EventStore>,
}

impl ChangeApplier {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub async fn apply(
        &self,
        event_id: Uuid,
        proposal: &EditProposal,
        actor_id: &str,
    ) -> GalaResult<AppliedResult> {
        let mut event = self
            .store
            .get(event_id)
            .await?
            .ok_or(GalaError::EventNotFound(event_id))?;

        for change in &proposal.changes {
            let live = change.field.current_value(&event);
            if live != change.current_value {
                return Err(GalaError::ConcurrentModification {
                    field: change.field.as_str().to_string(),
                    expected: change.current_value.clone(),
                    actual: live,
                });
            }
        }

        let mut applied_fields = Vec::with_capacity(proposal.changes.len());
        for change in &proposal.changes {
            change.field.apply_to(&mut event, &change.proposed_value)?;
            applied_fields.push(change.field);
        }
        event.updated_at = Utc::now();

        self.store.update(&event).await?;

        info!(
            event_id = %event_id,
            actor = actor_id,
            fields = applied_fields.len(),
            "edit proposal applied"
        );

        Ok(AppliedResult {
            event_id,
            applied_fields,
            summary: proposal.summary.clone(),
        })
    }
}
