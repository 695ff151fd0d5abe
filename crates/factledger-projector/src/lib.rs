//! Factledger Projector
//!
//! Derives the current truth for each fact key from the append-only event
//! log. The log is the only system of record; everything produced here can be
//! thrown away and recomputed.
//!
//! - [`project`] is the pure reducer over a slice of events
//! - [`current_facts`] projects a deal straight from a store
//! - [`current_facts_from_view`] reads the materialized snapshot and falls
//!   back to a full projection when it is missing or unreadable
//! - [`update_facts_in_memory`] applies verification verdicts to copies,
//!   for hand-offs inside one pipeline run
//!
//! Concurrent writers may both supersede the same predecessor. No winner is
//! chosen at write time: the newest unsuperseded event is the frontier.
//!
//! # Examples
//!
//! ```
//! use factledger_domain::{DealId, EventType, FactEvent, FactKey, FactSource, FactValue};
//! use factledger_projector::project;
//!
//! let created = FactEvent::new(
//!     DealId::from("deal-1"),
//!     FactKey::parse("financial.arr").unwrap(),
//!     FactValue::Number(1_000_000.0),
//!     "$1M",
//!     FactSource::PitchDeck,
//!     80,
//!     EventType::Created,
//! );
//! let facts = project(&[created]);
//! assert_eq!(facts[0].current_display_value, "$1M");
//! ```

#![warn(missing_docs)]

mod error;
mod memory;
mod projection;
mod view;

pub use error::ProjectorError;
pub use memory::{update_facts_in_memory, FactValidation, Verdict};
pub use projection::{pending_reviews, project};
pub use view::{current_facts, current_facts_from_view, refresh_view};
