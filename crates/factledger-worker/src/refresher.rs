//! Best-effort refresh of the current-facts snapshots

use std::path::Path;

use factledger_domain::traits::FactEventStore;
use factledger_domain::DealId;
use factledger_projector::refresh_view;
use factledger_store::SqliteStore;

use crate::WorkerError;

/// Outcome of one refresh pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    /// Deals whose snapshot was rewritten
    pub deals_refreshed: usize,

    /// Facts written across all snapshots
    pub facts_written: usize,

    /// Deals that failed, with the error
    pub failures: Vec<(DealId, String)>,
}

/// Rewrites every deal's snapshot on a dedicated connection
///
/// Readers keep using their own connections while a refresh is in progress;
/// with WAL they see the previous snapshot until the new one commits.
pub struct ViewRefresher {
    store: SqliteStore,
}

impl ViewRefresher {
    /// Open a dedicated connection to the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WorkerError> {
        Ok(Self::new(SqliteStore::new(path)?))
    }

    /// Refresh through an existing store
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    /// Get the underlying store
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Refresh the snapshot of every deal in the log
    ///
    /// A deal that fails is logged and skipped; its readers keep falling
    /// back to full recomputation. Only failing to list the deals is an
    /// error.
    pub fn refresh_all(&mut self) -> Result<RefreshReport, WorkerError> {
        let deals = self.store.list_deals()?;
        let mut report = RefreshReport::default();

        for deal_id in deals {
            match refresh_view(&mut self.store, &deal_id) {
                Ok(facts) => {
                    report.deals_refreshed += 1;
                    report.facts_written += facts;
                }
                Err(e) => {
                    tracing::warn!(deal = %deal_id, error = %e, "snapshot refresh failed, skipping deal");
                    report.failures.push((deal_id, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}
