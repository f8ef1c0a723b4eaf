//! # Actor State Persistence
//!
//! The durable (state, payload, version) record behind every actor, behind a
//! narrow load / compare-and-set interface so the run loop's recovery logic
//! can be tested against an in-memory fake. The versioned compare-and-set is
//! what serializes concurrent resumes of the same actor id.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{PgPool, Row};

use super::errors::{ActorError, ActorResult};

/// The authoritative persisted record for one actor id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedActorState {
    pub state_name: String,
    pub payload: Value,
    pub version: i64,
}

/// Key-value store mapping actor id to its persisted state record.
///
/// Implementations must provide atomic read-modify-write per key; the engine
/// persists a transition before any outward message is considered sent.
#[async_trait]
pub trait ActorStateStore: Send + Sync {
    /// Load the current record for an actor, if one exists
    async fn load(&self, actor_id: &str) -> ActorResult<Option<PersistedActorState>>;

    /// Insert the initial record if none exists; returns the current record
    /// either way
    async fn create_if_absent(
        &self,
        actor_id: &str,
        state_name: &str,
        payload: &Value,
    ) -> ActorResult<PersistedActorState>;

    /// Atomically replace the record if its version still matches
    /// `expected_version`. Returns the new record on success, `None` when
    /// another writer advanced the version first.
    async fn compare_and_set(
        &self,
        actor_id: &str,
        expected_version: i64,
        state_name: &str,
        payload: &Value,
    ) -> ActorResult<Option<PersistedActorState>>;
}

/// In-memory state store for tests and the demo binary
#[derive(Debug, Default)]
pub struct InMemoryActorStateStore {
    records: DashMap<String, PersistedActorState>,
}

impl InMemoryActorStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActorStateStore for InMemoryActorStateStore {
    async fn load(&self, actor_id: &str) -> ActorResult<Option<PersistedActorState>> {
        Ok(self.records.get(actor_id).map(|r| r.clone()))
    }

    async fn create_if_absent(
        &self,
        actor_id: &str,
        state_name: &str,
        payload: &Value,
    ) -> ActorResult<PersistedActorState> {
        let record = self
            .records
            .entry(actor_id.to_string())
            .or_insert_with(|| PersistedActorState {
                state_name: state_name.to_string(),
                payload: payload.clone(),
                version: 1,
            });
        Ok(record.clone())
    }

    async fn compare_and_set(
        &self,
        actor_id: &str,
        expected_version: i64,
        state_name: &str,
        payload: &Value,
    ) -> ActorResult<Option<PersistedActorState>> {
        match self.records.get_mut(actor_id) {
            Some(mut record) if record.version == expected_version => {
                record.state_name = state_name.to_string();
                record.payload = payload.clone();
                record.version += 1;
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }
}

/// Postgres-backed state store: one row per actor id, versioned for
/// compare-and-set
#[derive(Debug, Clone)]
pub struct PgActorStateStore {
    pool: PgPool,
}

impl PgActorStateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing table if it does not exist yet
    pub async fn ensure_schema(&self) -> ActorResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pipeline_actor_state (
                actor_id   TEXT PRIMARY KEY,
                state_name TEXT NOT NULL,
                payload    JSONB NOT NULL,
                version    BIGINT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ActorError::persistence(format!("Failed to ensure schema: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl ActorStateStore for PgActorStateStore {
    async fn load(&self, actor_id: &str) -> ActorResult<Option<PersistedActorState>> {
        let row = sqlx::query(
            r#"
            SELECT state_name, payload, version
            FROM pipeline_actor_state
            WHERE actor_id = $1
            "#,
        )
        .bind(actor_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ActorError::persistence(format!("Failed to load actor state: {e}")))?;

        Ok(row.map(|r| PersistedActorState {
            state_name: r.get("state_name"),
            payload: r.get("payload"),
            version: r.get("version"),
        }))
    }

    async fn create_if_absent(
        &self,
        actor_id: &str,
        state_name: &str,
        payload: &Value,
    ) -> ActorResult<PersistedActorState> {
        sqlx::query(
            r#"
            INSERT INTO pipeline_actor_state (actor_id, state_name, payload, version)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (actor_id) DO NOTHING
            "#,
        )
        .bind(actor_id)
        .bind(state_name)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| ActorError::persistence(format!("Failed to create actor state: {e}")))?;

        self.load(actor_id).await?.ok_or_else(|| {
            ActorError::persistence(format!("Actor state vanished after insert: {actor_id}"))
        })
    }

    async fn compare_and_set(
        &self,
        actor_id: &str,
        expected_version: i64,
        state_name: &str,
        payload: &Value,
    ) -> ActorResult<Option<PersistedActorState>> {
        let row = sqlx::query(
            r#"
            UPDATE pipeline_actor_state
            SET state_name = $2, payload = $3, version = version + 1, updated_at = now()
            WHERE actor_id = $1 AND version = $4
            RETURNING state_name, payload, version
            "#,
        )
        .bind(actor_id)
        .bind(state_name)
        .bind(payload)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ActorError::persistence(format!("Failed to update actor state: {e}")))?;

        Ok(row.map(|r| PersistedActorState {
            state_name: r.get("state_name"),
            payload: r.get("payload"),
            version: r.get("version"),
        }))
    }
}
