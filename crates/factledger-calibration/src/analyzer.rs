//! Calibration of system-reported confidence against human overrides

use std::collections::HashSet;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use factledger_domain::traits::{EventQuery, FactEventStore};
use factledger_domain::{CreatedBy, EventId, EventType, FactEvent, FactSource};

use crate::{CalibrationConfig, CalibrationError, CalibrationReport};

/// Measures how often confident system observations were later overridden
///
/// An observation counts when it was appended by the system as a CREATED or
/// SUPERSEDED event inside the window. It counts as overridden when any
/// BA_OVERRIDE event, at any time, names it in `supersedes_event_id`.
///
/// # Examples
///
/// ```no_run
/// use chrono::Utc;
/// use factledger_calibration::{CalibrationAnalyzer, CalibrationConfig};
/// use factledger_store::SqliteStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStore::new("factledger.db")?;
/// let analyzer = CalibrationAnalyzer::new(CalibrationConfig::default())?;
/// let report = analyzer.analyze(&store, Utc::now())?;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CalibrationAnalyzer {
    config: CalibrationConfig,
}

impl CalibrationAnalyzer {
    /// Create an analyzer, rejecting an invalid configuration
    pub fn new(config: CalibrationConfig) -> Result<Self, CalibrationError> {
        config.validate().map_err(CalibrationError::Config)?;
        Ok(Self { config })
    }

    /// Get the active configuration
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Analyse the configured window ending at `window_end`
    pub fn analyze<S>(&self, store: &S, window_end: DateTime<Utc>) -> Result<CalibrationReport, CalibrationError>
    where
        S: FactEventStore,
        S::Error: Display,
    {
        let window_start = window_end - self.config.window();

        let in_window = store
            .query_events(&EventQuery {
                created_after: Some(window_start),
                created_before: Some(window_end),
                ..Default::default()
            })
            .map_err(|e| CalibrationError::Store(e.to_string()))?;

        // Overrides landing after the window still count against it
        let overrides = store
            .query_events(&EventQuery {
                source: Some(FactSource::BaOverride),
                ..Default::default()
            })
            .map_err(|e| CalibrationError::Store(e.to_string()))?;

        let report = self.analyze_events(&in_window, &overrides, window_start, window_end);

        tracing::info!(
            window_start = %window_start,
            window_end = %window_end,
            events = report.total_events(),
            overridden = report.total_overridden(),
            over_confident = report.over_confident_bands().len(),
            "calibration run complete"
        );
        for band in report.over_confident_bands() {
            let stats = report.band(band);
            tracing::warn!(
                band = %band,
                rate = stats.override_rate(),
                ceiling = self.config.max_override_rate(band),
                "confidence band is over-confident"
            );
        }

        Ok(report)
    }

    /// Build a report from already-fetched events
    ///
    /// Events outside the window or not counted as system observations are
    /// skipped, so callers may pass a superset.
    pub fn analyze_events(
        &self,
        events: &[FactEvent],
        overrides: &[FactEvent],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> CalibrationReport {
        let overridden: HashSet<EventId> = overrides
            .iter()
            .filter(|e| e.source == FactSource::BaOverride)
            .filter_map(|e| e.supersedes_event_id)
            .collect();

        let mut report = CalibrationReport::new(window_start, window_end);
        for event in events
            .iter()
            .filter(|e| e.created_at >= window_start && e.created_at < window_end)
            .filter(|e| is_system_observation(e))
        {
            report.record(event.source_confidence, overridden.contains(&event.id));
        }
        report.flag(&self.config);
        report
    }
}

fn is_system_observation(event: &FactEvent) -> bool {
    event.created_by == CreatedBy::System
        && event.source != FactSource::BaOverride
        && matches!(event.event_type, EventType::Created | EventType::Superseded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfidenceBand;
    use chrono::Duration;
    use factledger_domain::{DealId, FactKey, FactValue};

    fn observation(confidence: u8, at: DateTime<Utc>) -> FactEvent {
        FactEvent::new(
            DealId::from("deal-cal"),
            FactKey::parse("financial.arr").unwrap(),
            FactValue::Number(1.0),
            "1",
            FactSource::PitchDeck,
            confidence,
            EventType::Created,
        )
        .at(at)
    }

    fn override_of(target: &FactEvent) -> FactEvent {
        let mut event = observation(100, target.created_at + Duration::days(1)).superseding(target.id).by_human();
        event.source = FactSource::BaOverride;
        event.event_type = EventType::Superseded;
        event
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let end = Utc::now();
        (end - Duration::days(30), end)
    }

    #[test]
    fn test_overrides_are_attributed_to_bands() {
        let (start, end) = window();
        let mid = start + Duration::days(10);
        let events = vec![observation(97, mid), observation(96, mid), observation(88, mid)];
        let overrides = vec![override_of(&events[0])];

        let report = CalibrationAnalyzer::default().analyze_events(&events, &overrides, start, end);
        let top = report.band(ConfidenceBand::Top);
        assert_eq!(top.total, 2);
        assert_eq!(top.overridden, 1);
        assert_eq!(report.band(ConfidenceBand::High).total, 1);
        assert_eq!(report.band(ConfidenceBand::High).overridden, 0);
    }

    #[test]
    fn test_window_bounds() {
        let (start, end) = window();
        let events = vec![
            observation(99, start - Duration::seconds(1)),
            observation(99, start),
            observation(99, end),
        ];
        let report = CalibrationAnalyzer::default().analyze_events(&events, &[], start, end);
        assert_eq!(report.total_events(), 1);
    }

    #[test]
    fn test_only_system_observations_count() {
        let (start, end) = window();
        let mid = start + Duration::days(1);
        let human = observation(99, mid).by_human();
        let mut dispute = observation(99, mid);
        dispute.event_type = EventType::Disputed;
        let target = observation(99, mid);
        let mut own_override = override_of(&target);
        own_override.created_by = CreatedBy::System;

        let events = vec![human, dispute, own_override];
        let report = CalibrationAnalyzer::default().analyze_events(&events, &[], start, end);
        assert_eq!(report.total_events(), 0);
    }

    #[test]
    fn test_non_override_supersession_is_ignored() {
        let (start, end) = window();
        let target = observation(99, start + Duration::days(1));
        let mut replacement = override_of(&target);
        replacement.source = FactSource::DataRoom;

        let report = CalibrationAnalyzer::default().analyze_events(
            std::slice::from_ref(&target),
            &[replacement],
            start,
            end,
        );
        assert_eq!(report.total_overridden(), 0);
    }

    #[test]
    fn test_over_confidence_flagged() {
        let (start, end) = window();
        let mid = start + Duration::days(5);
        let events: Vec<FactEvent> = (0..10).map(|_| observation(98, mid)).collect();
        let overrides: Vec<FactEvent> = events.iter().take(3).map(override_of).collect();

        let report = CalibrationAnalyzer::default().analyze_events(&events, &overrides, start, end);
        assert_eq!(report.over_confident_bands(), vec![ConfidenceBand::Top]);
        assert!((report.band(ConfidenceBand::Top).override_rate() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CalibrationConfig {
            min_sample_size: 0,
            ..CalibrationConfig::default()
        };
        assert!(matches!(CalibrationAnalyzer::new(config), Err(CalibrationError::Config(_))));
    }
}
