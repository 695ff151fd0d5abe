//! Materialized current-facts snapshot

use chrono::{DateTime, Utc};
use factledger_domain::traits::SnapshotStore;
use factledger_domain::{
    CurrentFact, DealId, DomainError, EventId, FactCategory, FactKey, FactSource,
};
use rusqlite::{params, OptionalExtension, Row};

use crate::{conversion_error, from_nanos, parse_column, to_nanos, SqliteStore, StoreError};

/// Bookkeeping for a deal's snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotInfo {
    /// Deal the snapshot belongs to
    pub deal_id: DealId,
    /// When it was last rebuilt
    pub refreshed_at: DateTime<Utc>,
    /// Number of facts it holds
    pub fact_count: usize,
}

impl SqliteStore {
    /// When the deal's snapshot was last rebuilt, if ever
    pub fn snapshot_info(&self, deal_id: &DealId) -> Result<Option<SnapshotInfo>, StoreError> {
        let refreshed: Option<i64> = self
            .conn
            .query_row(
                "SELECT refreshed_at FROM view_refreshes WHERE deal_id = ?1",
                params![deal_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(refreshed) = refreshed else {
            return Ok(None);
        };

        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM current_facts_view WHERE deal_id = ?1",
            params![deal_id.as_str()],
            |row| row.get(0),
        )?;

        Ok(Some(SnapshotInfo {
            deal_id: deal_id.clone(),
            refreshed_at: from_nanos(refreshed),
            fact_count: count as usize,
        }))
    }
}

impl SnapshotStore for SqliteStore {
    type Error = StoreError;

    fn read_snapshot(&self, deal_id: &DealId) -> Result<Option<Vec<CurrentFact>>, StoreError> {
        if self.snapshot_info(deal_id)?.is_none() {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(
            "SELECT deal_id, fact_key, category, current_event_id, current_value,
                    current_display_value, unit, current_source, current_confidence,
                    is_disputed, reliability, first_seen_at, last_updated_at
             FROM current_facts_view WHERE deal_id = ?1 ORDER BY fact_key",
        )?;

        let facts = stmt
            .query_map(params![deal_id.as_str()], row_to_fact)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(facts))
    }

    fn write_snapshot(&mut self, deal_id: &DealId, facts: &[CurrentFact]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM current_facts_view WHERE deal_id = ?1",
            params![deal_id.as_str()],
        )?;

        for fact in facts {
            let reliability = fact
                .reliability
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            tx.execute(
                "INSERT INTO current_facts_view (
                    deal_id, fact_key, category, current_event_id, current_value,
                    current_display_value, unit, current_source, current_confidence,
                    is_disputed, reliability, first_seen_at, last_updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    deal_id.as_str(),
                    fact.fact_key.as_str(),
                    fact.category.as_str(),
                    &fact.current_event_id.to_bytes()[..],
                    serde_json::to_string(&fact.current_value)?,
                    &fact.current_display_value,
                    &fact.unit,
                    fact.current_source.as_str(),
                    fact.current_confidence,
                    fact.is_disputed,
                    reliability,
                    to_nanos(fact.first_seen_at)?,
                    to_nanos(fact.last_updated_at)?,
                ],
            )?;
        }

        tx.execute(
            "INSERT INTO view_refreshes (deal_id, refreshed_at) VALUES (?1, ?2)
             ON CONFLICT(deal_id) DO UPDATE SET refreshed_at = excluded.refreshed_at",
            params![deal_id.as_str(), to_nanos(Utc::now())?],
        )?;

        tx.commit()?;
        tracing::debug!(deal = %deal_id, facts = facts.len(), "wrote current-facts snapshot");
        Ok(())
    }
}

fn row_to_fact(row: &Row<'_>) -> rusqlite::Result<CurrentFact> {
    let fact_key_raw: String = row.get(1)?;
    let fact_key = FactKey::parse(&fact_key_raw).map_err(|e| conversion_error(1, e))?;

    let category_raw: String = row.get(2)?;
    let category = parse_column(2, &category_raw, FactCategory::parse, DomainError::UnknownCategory)?;

    let event_bytes: Vec<u8> = row.get(3)?;
    let current_event_id = EventId::from_bytes(&event_bytes).map_err(|e| conversion_error(3, e))?;

    let value_raw: String = row.get(4)?;
    let current_value = serde_json::from_str(&value_raw).map_err(|e| conversion_error(4, e))?;

    let source_raw: String = row.get(7)?;
    let current_source = parse_column(7, &source_raw, FactSource::parse, DomainError::UnknownSource)?;

    let reliability = row
        .get::<_, Option<String>>(10)?
        .map(|raw| serde_json::from_str(&raw).map_err(|e| conversion_error(10, e)))
        .transpose()?;

    Ok(CurrentFact {
        deal_id: DealId::from(row.get::<_, String>(0)?),
        fact_key,
        category,
        current_event_id,
        current_value,
        current_display_value: row.get(5)?,
        unit: row.get(6)?,
        current_source,
        current_confidence: row.get(8)?,
        is_disputed: row.get(9)?,
        dispute_details: None,
        event_history: Vec::new(),
        first_seen_at: from_nanos(row.get(11)?),
        last_updated_at: from_nanos(row.get(12)?),
        reliability,
    })
}
