//! End-to-end edit flow: analyze -> propose -> apply, including the
//! optimistic-concurrency conflict on stale proposals.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use gala_core::{EventField, GalaError};
use gala_engine::{EditOutcome, EngineConfig, GalaEngine, HeuristicExtractor};
use gala_storage::SqliteEventStore;

const SCENARIO: &str =
    "Birthday party for Sam next Saturday at 7pm at Lakeview Hall for 25 guests, budget $500";

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
}

fn now() -> DateTime<Utc> {
    "2026-08-07T12:00:00Z".parse().unwrap()
}

fn engine() -> GalaEngine {
    let store = Arc::new(SqliteEventStore::open_in_memory().unwrap());
    GalaEngine::new(EngineConfig::default(), store)
}

async fn seeded_engine() -> (GalaEngine, uuid::Uuid) {
    let engine = engine();
    let draft = HeuristicExtractor::default().extract(SCENARIO, reference());
    let record = engine.create_event(draft).await.unwrap();
    (engine, record.id)
}

#[tokio::test]
async fn propose_and_apply_time_change() {
    let (engine, event_id) = seeded_engine().await;

    let outcome = engine
        .propose_edit(event_id, "move it to 9pm", now())
        .await
        .unwrap();
    let proposal = match outcome {
        EditOutcome::Proposal(p) => p,
        EditOutcome::NeedsClarification { question } => {
            panic!("unexpected clarification: {question}")
        }
    };

    assert!(proposal.overall_impact.reschedule_required);
    assert!(proposal.overall_impact.attendee_notification);

    let applied = engine
        .apply_edit(event_id, &proposal, "user-1")
        .await
        .unwrap();
    assert!(applied.applied_fields.contains(&EventField::Time));

    let updated = engine.get_event(event_id).await.unwrap();
    assert_eq!(updated.draft.time, "21:00");
}

#[tokio::test]
async fn vague_edit_asks_for_clarification() {
    let (engine, event_id) = seeded_engine().await;

    let outcome = engine
        .propose_edit(event_id, "maybe change something", now())
        .await
        .unwrap();
    match outcome {
        EditOutcome::NeedsClarification { question } => assert!(!question.is_empty()),
        EditOutcome::Proposal(p) => panic!("expected clarification, got {}", p.summary),
    }
}

#[tokio::test]
async fn stale_proposal_conflicts_on_second_apply() {
    let (engine, event_id) = seeded_engine().await;

    // Two sessions build proposals from the same snapshot.
    let outcome_a = engine
        .propose_edit(event_id, "move it to 9pm", now())
        .await
        .unwrap();
    let outcome_b = engine
        .propose_edit(event_id, "move it to 8pm", now())
        .await
        .unwrap();
    let (proposal_a, proposal_b) = match (outcome_a, outcome_b) {
        (EditOutcome::Proposal(a), EditOutcome::Proposal(b)) => (a, b),
        _ => panic!("expected proposals"),
    };

    // First writer wins.
    engine
        .apply_edit(event_id, &proposal_a, "user-1")
        .await
        .unwrap();

    // Second writer's snapshot is stale: its recorded current values no
    // longer match the live event.
    let err = engine
        .apply_edit(event_id, &proposal_b, "user-2")
        .await
        .unwrap_err();
    assert!(matches!(err, GalaError::ConcurrentModification { .. }));
    assert!(err.is_retryable());

    // Retrying from a fresh snapshot succeeds.
    let outcome = engine
        .propose_edit(event_id, "move it to 8pm", now())
        .await
        .unwrap();
    let proposal = match outcome {
        EditOutcome::Proposal(p) => p,
        _ => panic!("expected proposal"),
    };
    engine
        .apply_edit(event_id, &proposal, "user-2")
        .await
        .unwrap();
    let updated = engine.get_event(event_id).await.unwrap();
    assert_eq!(updated.draft.time, "20:00");
}

#[tokio::test]
async fn venue_edit_updates_location() {
    let (engine, event_id) = seeded_engine().await;

    let outcome = engine
        .propose_edit(event_id, "change the venue to Pier 9", now())
        .await
        .unwrap();
    let proposal = match outcome {
        EditOutcome::Proposal(p) => p,
        _ => panic!("expected proposal"),
    };
    assert!(proposal.overall_impact.venue_change);

    engine
        .apply_edit(event_id, &proposal, "user-1")
        .await
        .unwrap();
    let updated = engine.get_event(event_id).await.unwrap();
    assert_eq!(updated.draft.location, "Pier 9");
}

#[tokio::test]
async fn apply_against_missing_event_fails() {
    let (engine, event_id) = seeded_engine().await;

    let outcome = engine
        .propose_edit(event_id, "move it to 9pm", now())
        .await
        .unwrap();
    let proposal = match outcome {
        EditOutcome::Proposal(p) => p,
        _ => panic!("expected proposal"),
    };

    let missing = uuid::Uuid::new_v4();
    let err = engine
        .apply_edit(missing, &proposal, "user-1")
        .await
        .unwrap_err();
    assert!(matches!(err, GalaError::EventNotFound(_)));
}
