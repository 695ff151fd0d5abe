//! Factledger Domain Layer
//!
//! Core data model for the fact ledger: the authoritative "current truth" for
//! structured facts extracted about a deal from sources of differing authority.
//! Infrastructure (storage, background jobs) lives in other crates and plugs in
//! through the traits defined in [`traits`].
//!
//! ## Key Concepts
//!
//! - **Fact key**: canonical dotted identifier drawn from a fixed [`taxonomy`]
//! - **Fact event**: immutable, append-only observation of a fact; updates are
//!   new events that point at the event they supersede
//! - **Source**: where an observation came from, with a fixed priority order
//! - **Current fact**: derived view of the frontier event for a key
//! - **Reliability**: epistemic tag, orthogonal to source priority
//!
//! ## Architecture
//!
//! - Pure data and validation only, no I/O
//! - Values are typed per taxonomy entry and validated at ingestion
//! - Trait definitions for the durable event log and its snapshot

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod contradiction;
pub mod current;
pub mod error;
pub mod event;
pub mod extracted;
pub mod reliability;
pub mod source;
pub mod taxonomy;
pub mod traits;
pub mod value;

// Re-exports for convenience
pub use contradiction::{ContradictionInfo, Significance};
pub use current::{CurrentFact, DisputeDetails};
pub use error::DomainError;
pub use event::{CreatedBy, DealId, EventId, EventType, FactEvent};
pub use extracted::{ExtractedFact, RawExtractedFact};
pub use reliability::{Reliability, ReliabilityClassification};
pub use source::FactSource;
pub use taxonomy::{FactCategory, FactKey, TaxonomyEntry, ValueKind};
pub use value::FactValue;
