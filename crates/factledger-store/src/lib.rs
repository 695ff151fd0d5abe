//! Factledger Storage Layer
//!
//! Implements the [`FactEventStore`] and [`SnapshotStore`] traits on SQLite.
//!
//! # Architecture
//!
//! - `fact_events`: the append-only event log. UPDATE and DELETE are rejected
//!   by triggers, so immutability does not depend on callers behaving.
//! - `current_facts_view` + `view_refreshes`: the optional materialized
//!   projection, replaced per deal in one transaction.
//!
//! # Examples
//!
//! ```no_run
//! use factledger_store::SqliteStore;
//!
//! let store = SqliteStore::in_memory().unwrap();
//! // Store is now ready for event operations
//! ```

#![warn(missing_docs)]

mod snapshot;

pub use snapshot::SnapshotInfo;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use factledger_domain::traits::{EventQuery, FactEventStore};
use factledger_domain::{
    CreatedBy, DealId, DomainError, EventId, EventType, FactCategory, FactEvent, FactKey,
    FactSource, Reliability,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data violates the domain model
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Event id already present in the log
    #[error("Duplicate event: {0}")]
    Duplicate(EventId),

    /// `supersedes_event_id` does not name a valid predecessor
    #[error("Invalid supersession reference on event {event_id}: {reason}")]
    InvalidSupersession {
        /// Event carrying the bad reference
        event_id: EventId,
        /// What was wrong with it
        reason: String,
    },
}

impl From<DomainError> for StoreError {
    fn from(e: DomainError) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

const EVENT_COLUMNS: &str = "id, deal_id, fact_key, category, value, display_value, unit, source, \
     source_document_id, source_confidence, extracted_text, reliability, event_type, \
     supersedes_event_id, created_at, created_by, reason";

/// SQLite-based implementation of [`FactEventStore`]
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread (or background job)
/// should open its own `SqliteStore` on the same database file; file-backed
/// stores run in WAL mode so readers are not blocked by a snapshot refresh.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use factledger_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("factledger.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(journal_mode = %mode, "opened fact store");
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::from_connection(conn)
    }

    /// Create a private in-memory database (useful for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Number of events stored for a deal
    pub fn event_count(&self, deal_id: &DealId) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM fact_events WHERE deal_id = ?1",
            params![deal_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Check the event's id and supersession reference, then insert it
    fn insert_checked(tx: &Transaction<'_>, event: &FactEvent) -> Result<(), StoreError> {
        let id_bytes = event.id.to_bytes();

        let exists = tx
            .query_row(
                "SELECT 1 FROM fact_events WHERE id = ?1",
                params![&id_bytes[..]],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if exists {
            return Err(StoreError::Duplicate(event.id));
        }

        if let Some(target) = event.supersedes_event_id {
            let target_bytes = target.to_bytes();
            let predecessor: Option<(String, String)> = tx
                .query_row(
                    "SELECT deal_id, fact_key FROM fact_events WHERE id = ?1",
                    params![&target_bytes[..]],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let reason = match predecessor {
                None => Some(format!("event {} does not exist", target)),
                Some((deal, _)) if deal != event.deal_id.as_str() => {
                    Some(format!("event {} belongs to deal {}", target, deal))
                }
                Some((_, key)) if key != event.fact_key.as_str() => {
                    Some(format!("event {} is for fact key {}", target, key))
                }
                Some(_) => None,
            };
            if let Some(reason) = reason {
                return Err(StoreError::InvalidSupersession {
                    event_id: event.id,
                    reason,
                });
            }
        }

        let created_at = to_nanos(event.created_at)?;
        let value = serde_json::to_string(&event.value)?;
        let supersedes = event.supersedes_event_id.map(|id| id.to_bytes().to_vec());

        tx.execute(
            &format!(
                "INSERT INTO fact_events ({}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                EVENT_COLUMNS
            ),
            params![
                &id_bytes[..],
                event.deal_id.as_str(),
                event.fact_key.as_str(),
                event.category.as_str(),
                value,
                &event.display_value,
                &event.unit,
                event.source.as_str(),
                &event.source_document_id,
                event.source_confidence,
                &event.extracted_text,
                event.reliability.map(|r| r.as_str()),
                event.event_type.as_str(),
                supersedes,
                created_at,
                event.created_by.as_str(),
                &event.reason,
            ],
        )?;
        Ok(())
    }
}

impl FactEventStore for SqliteStore {
    type Error = StoreError;

    fn append_event(&mut self, event: FactEvent) -> Result<EventId, StoreError> {
        let tx = self.conn.transaction()?;
        Self::insert_checked(&tx, &event)?;
        tx.commit()?;
        tracing::debug!(
            event_id = %event.id,
            deal = %event.deal_id,
            key = %event.fact_key,
            event_type = %event.event_type,
            "appended fact event"
        );
        Ok(event.id)
    }

    fn append_batch(&mut self, events: Vec<FactEvent>) -> Result<Vec<EventId>, StoreError> {
        let tx = self.conn.transaction()?;
        for event in &events {
            // Any error drops the transaction, which rolls the whole batch back
            Self::insert_checked(&tx, event)?;
        }
        tx.commit()?;
        tracing::debug!(count = events.len(), "appended fact event batch");
        Ok(events.iter().map(|e| e.id).collect())
    }

    fn get_event(&self, id: EventId) -> Result<Option<FactEvent>, StoreError> {
        let id_bytes = id.to_bytes();
        let event = self
            .conn
            .query_row(
                &format!("SELECT {} FROM fact_events WHERE id = ?1", EVENT_COLUMNS),
                params![&id_bytes[..]],
                row_to_event,
            )
            .optional()?;
        Ok(event)
    }

    fn events_for_deal(&self, deal_id: &DealId) -> Result<Vec<FactEvent>, StoreError> {
        self.query_events(&EventQuery::for_deal(deal_id.clone()))
    }

    fn query_events(&self, query: &EventQuery) -> Result<Vec<FactEvent>, StoreError> {
        let mut sql = format!("SELECT {} FROM fact_events WHERE 1=1", EVENT_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(deal_id) = &query.deal_id {
            sql.push_str(" AND deal_id = ?");
            params.push(Box::new(deal_id.as_str().to_string()));
        }

        if let Some(key) = query.fact_key {
            sql.push_str(" AND fact_key = ?");
            params.push(Box::new(key.as_str()));
        }

        if let Some(category) = query.category {
            sql.push_str(" AND category = ?");
            params.push(Box::new(category.as_str()));
        }

        if let Some(event_type) = query.event_type {
            sql.push_str(" AND event_type = ?");
            params.push(Box::new(event_type.as_str()));
        }

        if let Some(source) = query.source {
            sql.push_str(" AND source = ?");
            params.push(Box::new(source.as_str()));
        }

        if let Some(after) = query.created_after {
            sql.push_str(" AND created_at >= ?");
            params.push(Box::new(to_nanos(after)?));
        }

        if let Some(before) = query.created_before {
            sql.push_str(" AND created_at < ?");
            params.push(Box::new(to_nanos(before)?));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let events = stmt
            .query_map(&param_refs[..], row_to_event)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }

    fn list_deals(&self) -> Result<Vec<DealId>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT deal_id FROM fact_events ORDER BY deal_id")?;
        let deals = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|r| r.map(DealId::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(deals)
    }
}

/// Nanoseconds since the epoch; keeps full timestamp precision
pub(crate) fn to_nanos(at: DateTime<Utc>) -> Result<i64, StoreError> {
    at.timestamp_nanos_opt()
        .ok_or_else(|| StoreError::InvalidData(format!("timestamp {} out of range", at)))
}

pub(crate) fn from_nanos(nanos: i64) -> DateTime<Utc> {
    Utc.timestamp_nanos(nanos)
}

/// Wrap a decoding failure so it can travel through rusqlite's row mapper
pub(crate) fn conversion_error<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

pub(crate) fn parse_column<T>(
    column: usize,
    raw: &str,
    parse: fn(&str) -> Option<T>,
    make_err: fn(String) -> DomainError,
) -> rusqlite::Result<T> {
    parse(raw).ok_or_else(|| conversion_error(column, make_err(raw.to_string())))
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<FactEvent> {
    let id_bytes: Vec<u8> = row.get(0)?;
    let id = EventId::from_bytes(&id_bytes).map_err(|e| conversion_error(0, e))?;

    let fact_key_raw: String = row.get(2)?;
    let fact_key = FactKey::parse(&fact_key_raw).map_err(|e| conversion_error(2, e))?;

    let category_raw: String = row.get(3)?;
    let category = parse_column(3, &category_raw, FactCategory::parse, DomainError::UnknownCategory)?;

    let value_raw: String = row.get(4)?;
    let value = serde_json::from_str(&value_raw).map_err(|e| conversion_error(4, e))?;

    let source_raw: String = row.get(7)?;
    let source = parse_column(7, &source_raw, FactSource::parse, DomainError::UnknownSource)?;

    let reliability = row
        .get::<_, Option<String>>(11)?
        .map(|raw| parse_column(11, &raw, Reliability::parse, DomainError::UnknownReliability))
        .transpose()?;

    let event_type_raw: String = row.get(12)?;
    let event_type =
        parse_column(12, &event_type_raw, EventType::parse, DomainError::UnknownEventType)?;

    let supersedes_event_id = row
        .get::<_, Option<Vec<u8>>>(13)?
        .map(|bytes| EventId::from_bytes(&bytes).map_err(|e| conversion_error(13, e)))
        .transpose()?;

    let created_by_raw: String = row.get(15)?;
    let created_by = parse_column(15, &created_by_raw, CreatedBy::parse, DomainError::InvalidId)?;

    Ok(FactEvent {
        id,
        deal_id: DealId::from(row.get::<_, String>(1)?),
        fact_key,
        category,
        value,
        display_value: row.get(5)?,
        unit: row.get(6)?,
        source,
        source_document_id: row.get(8)?,
        source_confidence: row.get(9)?,
        extracted_text: row.get(10)?,
        reliability,
        event_type,
        supersedes_event_id,
        created_at: from_nanos(row.get(14)?),
        created_by,
        reason: row.get(16)?,
    })
}
