//! Factledger Matcher
//!
//! Decides what happens to each candidate fact an extraction pass produces:
//! - `NEW` when the key has no current value
//! - `SUPERSEDE` when the candidate's source out-ranks (or ties) the current one
//! - `IGNORE` when the current value comes from a stronger source
//! - `REVIEW_NEEDED` when the values diverge too far for a machine to decide
//!
//! Contradictions are classified by relative delta for numeric keys and are
//! reported independently of the decision, so an ignored candidate still
//! leaves an audit trail.
//!
//! # Examples
//!
//! ```
//! use factledger_matcher::{Matcher, MatcherConfig};
//!
//! let matcher = Matcher::new(MatcherConfig::default()).unwrap();
//! let batch = matcher.match_facts_batch(&[], &[]);
//! assert_eq!(batch.total(), 0);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod matcher;

pub use config::MatcherConfig;
pub use error::MatcherError;
pub use matcher::{BatchMatch, ContradictionCheck, MatchResult, MatchType, MatchedFact, Matcher};
