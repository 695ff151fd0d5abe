//! Factledger Ingest
//!
//! The write path of the fact ledger. Extraction batches are matched against
//! a deal's current facts and the accepted decisions are appended to the
//! event log; analyst actions append human-originated events.
//!
//! # Architecture
//!
//! ```text
//! ExtractedFact → validation → Matcher (vs. projected current facts) → FactEventStore
//! ```
//!
//! # Decisions and events
//!
//! | Decision | Event written |
//! |----------|---------------|
//! | NEW | CREATED |
//! | SUPERSEDE | SUPERSEDED, pointing at the frontier |
//! | REVIEW_NEEDED | PENDING_REVIEW annotation (configurable) |
//! | IGNORE | none |
//!
//! REVIEW_NEEDED is a normal outcome, not an error. Only an analyst settles
//! it, through [`FactLedger::resolve_review`].
//!
//! # Example Usage
//!
//! ```no_run
//! use factledger_domain::{ExtractedFact, FactKey, FactSource, FactValue};
//! use factledger_ingest::{FactLedger, IngestRequest};
//! use factledger_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::new("factledger.db")?;
//! let mut ledger = FactLedger::with_defaults(store);
//!
//! let arr = ExtractedFact::new(
//!     FactKey::parse("financial.arr")?,
//!     FactValue::Number(1_200_000.0),
//!     "$1.2M",
//!     FactSource::DataRoom,
//!     92,
//! );
//! let result = ledger.ingest(IngestRequest::new("deal-42", vec![arr]))?;
//!
//! println!("Created: {}", result.created.len());
//! println!("Superseded: {}", result.superseded.len());
//! println!("Held for review: {}", result.needs_review.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod ledger;
mod types;


pub use config::IngestConfig;
pub use error::IngestError;
pub use ledger::FactLedger;
pub use types::{
    DisputeResolution, IngestMetadata, IngestRequest, IngestResult, Rejection, ReviewDecision,
    SubmittedFact,
};
