//! Factledger Presenter
//!
//! Source priority decides which observation wins; reliability decides how
//! the winning value may be framed. This crate attaches reliability to
//! current facts and renders them for prompt-driven consumers, never letting
//! a projection pass as a verified figure.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use factledger_presenter::{Presenter, ReliabilityClassifier};
//!
//! let as_of = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
//! let facts = ReliabilityClassifier::default().classify_facts(&[], as_of);
//! assert_eq!(Presenter::default().format_facts_for_scoring_agents(&facts), "No facts available.");
//! ```

#![warn(missing_docs)]

mod classifier;
mod config;
mod error;
mod render;

pub use classifier::ReliabilityClassifier;
pub use config::{ClassifierConfig, PresenterConfig, DEFAULT_TRUNCATION_MARKER};
pub use error::PresenterError;
pub use render::{PresentedFact, Presenter, Tier, RELIABILITY_LEGEND};
