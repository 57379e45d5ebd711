//! SQLite adapter for the event document store and the conversation log.
//!
//! Events are stored as JSON documents keyed by id — the engine treats
//! the store as a document store, so the row shape stays schemaless
//! apart from the timestamps used for listing.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use gala_core::{ConversationLog, EventRecord, EventStore, GalaError, GalaResult};

/// Connections in the pool. SQLite WAL mode supports 1 writer + N
/// readers, so even a small pool removes head-of-line blocking for
/// concurrent reads.
const DEFAULT_POOL_SIZE: usize = 4;

const MIGRATION: &str = "
CREATE TABLE IF NOT EXISTS events (
    id          TEXT PRIMARY KEY,
    data        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS conversation_log (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_text   TEXT NOT NULL,
    ai_text     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
";

pub struct SqliteEventStore {
    /// Round-robin pool; each connection behind its own Mutex so callers
    /// run synchronous rusqlite work without holding an async lock.
    pool: Vec<Mutex<Connection>>,
    next_slot: std::sync::atomic::AtomicUsize,
}

impl SqliteEventStore {
    pub fn open(path: &Path) -> GalaResult<Self> {
        let mut pool = Vec::with_capacity(DEFAULT_POOL_SIZE);
        for _ in 0..DEFAULT_POOL_SIZE {
            pool.push(Mutex::new(Self::open_connection(path)?));
        }
        let store = Self {
            pool,
            next_slot: std::sync::atomic::AtomicUsize::new(0),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn open_in_memory() -> GalaResult<Self> {
        // Shared-cache URI so every pooled connection sees the same
        // database; plain open_in_memory would isolate each one.
        let uri = format!("file:galadb{}?mode=memory&cache=shared", Uuid::new_v4());
        let flags = rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
            | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
            | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX
            | rusqlite::OpenFlags::SQLITE_OPEN_URI;
        let mut pool = Vec::with_capacity(DEFAULT_POOL_SIZE);
        for _ in 0..DEFAULT_POOL_SIZE {
            let conn = Connection::open_with_flags(&uri, flags)
                .map_err(|e| GalaError::Storage(format!("failed to open in-memory sqlite: {e}")))?;
            pool.push(Mutex::new(conn));
        }
        let store = Self {
            pool,
            next_slot: std::sync::atomic::AtomicUsize::new(0),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn open_connection(path: &Path) -> GalaResult<Connection> {
        let conn = Connection::open(path)
            .map_err(|e| GalaError::Storage(format!("failed to open sqlite: {e}")))?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;",
        )
        .map_err(|e| GalaError::Storage(format!("pragma error: {e}")))?;
        Ok(conn)
    }

    fn run_migrations(&self) -> GalaResult<()> {
        self.with_conn(|conn| {
            conn.execute_batch(MIGRATION)
                .map_err(|e| GalaError::Storage(format!("migration error: {e}")))
        })
    }

    /// Execute a synchronous closure with a pooled connection. The guard
    /// drops before any `.await`, keeping the enclosing futures `Send`.
    fn with_conn<F, T>(&self, f: F) -> GalaResult<T>
    where
        F: FnOnce(&Connection) -> GalaResult<T>,
    {
        let idx = self
            .next_slot
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            % self.pool.len();
        let conn = self.pool[idx]
            .lock()
            .map_err(|e| GalaError::Storage(e.to_string()))?;
        f(&conn)
    }
}

fn row_to_event(data: String) -> GalaResult<EventRecord> {
    serde_json::from_str(&data).map_err(GalaError::from)
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn insert(&self, event: &EventRecord) -> GalaResult<()> {
        let data = serde_json::to_string(event)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (id, data, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    event.id.to_string(),
                    data,
                    event.created_at.to_rfc3339(),
                    event.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| GalaError::Storage(format!("insert failed: {e}")))?;
            Ok(())
        })
    }

    async fn get(&self, id: Uuid) -> GalaResult<Option<EventRecord>> {
        let data: Option<String> = self.with_conn(|conn| {
            conn.query_row(
                "SELECT data FROM events WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| GalaError::Storage(format!("get failed: {e}")))
        })?;
        data.map(row_to_event).transpose()
    }

    async fn update(&self, event: &EventRecord) -> GalaResult<()> {
        let data = serde_json::to_string(event)?;
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE events SET data = ?2, updated_at = ?3 WHERE id = ?1",
                    params![
                        event.id.to_string(),
                        data,
                        event.updated_at.to_rfc3339(),
                    ],
                )
                .map_err(|e| GalaError::Storage(format!("update failed: {e}")))?;
            if changed == 0 {
                return Err(GalaError::EventNotFound(event.id));
            }
            Ok(())
        })
    }

    async fn delete(&self, id: Uuid) -> GalaResult<bool> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM events WHERE id = ?1", params![id.to_string()])
                .map_err(|e| GalaError::Storage(format!("delete failed: {e}")))?;
            Ok(changed > 0)
        })
    }

    async fn list(&self, limit: usize, offset: usize) -> GalaResult<Vec<EventRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT data FROM events ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                )
                .map_err(|e| GalaError::Storage(format!("list failed: {e}")))?;
            let rows = stmt
                .query_map(params![limit as i64, offset as i64], |row| {
                    row.get::<_, String>(0)
                })
                .map_err(|e| GalaError::Storage(format!("list failed: {e}")))?;

            let mut events = Vec::new();
            for row in rows {
                let data = row.map_err(|e| GalaError::Storage(e.to_string()))?;
                events.push(row_to_event(data)?);
            }
            Ok(events)
        })
    }
}

#[async_trait]
impl ConversationLog for SqliteEventStore {
    async fn append(&self, user_text: &str, ai_text: &str) -> GalaResult<()> {
        let now: DateTime<Utc> = Utc::now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversation_log (user_text, ai_text, created_at) VALUES (?1, ?2, ?3)",
                params![user_text, ai_text, now.to_rfc3339()],
            )
            .map_err(|e| GalaError::Storage(format!("log append failed: {e}")))?;
            Ok(())
        })
    }
}

impl SqliteEventStore {
    /// Number of logged extraction exchanges. Used by tests and ops
    /// tooling; the engine itself never reads the log back.
    pub fn conversation_count(&self) -> GalaResult<usize> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM conversation_log", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
            .map_err(|e| GalaError::Storage(format!("count failed: {e}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gala_core::{EventDraft, EventField, Organizer};

    fn sample_event() -> EventRecord {
        EventRecord::from_draft(EventDraft {
            title: "Launch Dinner".into(),
            event_type: "Meal".into(),
            date: "2026-10-01".parse().unwrap(),
            time: "19:00".into(),
            end_time: "21:00".into(),
            location: "The Annex".into(),
            address: String::new(),
            category: "Food & Drink".into(),
            description: "Celebrating the launch".into(),
            organizer: Organizer::named("Event Host"),
            price: "Free".into(),
            expected_guests: 12,
            max_attendees: 20,
            budget: Some(600.0),
            notes: Some("book the corner table".into()),
            schedule: Vec::new(),
            attendees: Vec::new(),
            images: Vec::new(),
            image_hint: "meal event".into(),
        })
    }

    #[tokio::test]
    async fn insert_get_roundtrip() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        let event = sample_event();
        store.insert(&event).await.unwrap();

        let loaded = store.get(event.id).await.unwrap().unwrap();
        assert_eq!(loaded, event);
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_persists_field_changes() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        let mut event = sample_event();
        store.insert(&event).await.unwrap();

        EventField::Location
            .apply_to(&mut event, &serde_json::json!("Rooftop Bar"))
            .unwrap();
        store.update(&event).await.unwrap();

        let loaded = store.get(event.id).await.unwrap().unwrap();
        assert_eq!(loaded.draft.location, "Rooftop Bar");
    }

    #[tokio::test]
    async fn update_missing_event_errors() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        let event = sample_event();
        let err = store.update(&event).await.unwrap_err();
        assert!(matches!(err, GalaError::EventNotFound(_)));
    }

    #[tokio::test]
    async fn delete_and_list() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        let a = sample_event();
        let b = sample_event();
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();

        assert_eq!(store.list(10, 0).await.unwrap().len(), 2);
        assert!(store.delete(a.id).await.unwrap());
        assert!(!store.delete(a.id).await.unwrap());
        assert_eq!(store.list(10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn conversation_log_appends() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        store.append("plan a party", "Here's the event").await.unwrap();
        store.append("plan a dinner", "Here's the event").await.unwrap();
        assert_eq!(store.conversation_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gala.db");
        let event = sample_event();

        {
            let store = SqliteEventStore::open(&path).unwrap();
            store.insert(&event).await.unwrap();
        }

        let store = SqliteEventStore::open(&path).unwrap();
        let loaded = store.get(event.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, event.id);
    }
}
