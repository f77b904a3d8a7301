//! `PostgreSQL` implementation of the [`Storage`] contract.
//!
//! Idempotence comes from the `events.id` primary key together with
//! `ON CONFLICT (id) DO NOTHING`: concurrent writers racing on the same
//! content hash all succeed and exactly one row survives. Sampling uses
//! `ORDER BY RANDOM() LIMIT 1` so every matching row is equally likely.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stream_types::{Event, EventError, EventId, ExtraFields};

use crate::error::DbError;
use crate::storage::Storage;

/// Operations on the `events` table.
#[derive(Clone)]
pub struct EventStore {
    pool: PgPool,
}

impl EventStore {
    /// Create a new event store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count events of `event_type` with `start <= time <= end`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Query`] if the query fails.
    pub async fn count_events(
        &self,
        event_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM events WHERE type = $1 AND time BETWEEN $2 AND $3",
        )
        .bind(event_type)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(|source| DbError::Query {
            event_type: event_type.to_owned(),
            source,
        })?;

        Ok(count)
    }

    /// Count rows carrying exactly this ID (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Query`] if the query fails.
    pub async fn count_by_id(&self, id: &EventId) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(r"SELECT COUNT(*) FROM events WHERE id = $1")
            .bind(id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|source| DbError::Query {
                event_type: String::from("*"),
                source,
            })?;

        Ok(count)
    }
}

#[async_trait]
impl Storage for EventStore {
    async fn insert_event(&self, event: &Event) -> Result<(), DbError> {
        let extra_fields = serde_json::to_value(event.extra_fields())?;

        let result = sqlx::query(
            r"INSERT INTO events (id, type, time, extra_fields)
              VALUES ($1, $2, $3, $4)
              ON CONFLICT (id) DO NOTHING",
        )
        .bind(event.id().as_str())
        .bind(event.event_type())
        .bind(event.time())
        .bind(extra_fields)
        .execute(&self.pool)
        .await
        .map_err(|source| DbError::Insert {
            id: event.id().to_string(),
            source,
        })?;

        if result.rows_affected() == 0 {
            tracing::debug!(id = %event.id(), "Duplicate event ignored");
        } else {
            tracing::debug!(id = %event.id(), event_type = event.event_type(), "Inserted event");
        }
        Ok(())
    }

    async fn get_event(
        &self,
        event_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Event>, DbError> {
        let row = sqlx::query_as::<_, EventRow>(
            r"SELECT id, type, time, extra_fields
              FROM events
              WHERE type = $1 AND time BETWEEN $2 AND $3
              ORDER BY RANDOM()
              LIMIT 1",
        )
        .bind(event_type)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| DbError::Query {
            event_type: event_type.to_owned(),
            source,
        })?;

        row.map(EventRow::into_event).transpose()
    }
}

/// A row from the `events` table.
///
/// Uses runtime types rather than compile-time checked types to
/// avoid requiring a live database during builds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Content-addressed event ID.
    pub id: String,
    /// Schema entry the event belongs to.
    #[sqlx(rename = "type")]
    pub event_type: String,
    /// Event timestamp.
    pub time: DateTime<Utc>,
    /// Extra fields as stored (`JSONB`).
    pub extra_fields: serde_json::Value,
}

impl EventRow {
    /// Rebuild the domain event, keeping the stored ID.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] if `extra_fields` is not a map of
    /// integers and strings, or if it holds an `id`, `type` or `time` key.
    pub fn into_event(self) -> Result<Event, DbError> {
        let extra_fields: ExtraFields =
            serde_json::from_value(self.extra_fields).map_err(|e| DbError::Decode {
                id: self.id.clone(),
                source: EventError::Serialization(e),
            })?;

        let id = self.id;
        Event::from_stored(EventId::from(id.as_str()), self.event_type, self.time, extra_fields)
            .map_err(|source| DbError::Decode { id, source })
    }
}
