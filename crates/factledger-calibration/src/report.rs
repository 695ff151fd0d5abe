//! Per-band calibration figures

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::CalibrationConfig;

/// Confidence band a system-reported confidence falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConfidenceBand {
    /// 95-100
    Top,
    /// 85-94
    High,
    /// 70-84
    Moderate,
}

impl ConfidenceBand {
    /// All bands, highest first
    pub const ALL: [ConfidenceBand; 3] = [ConfidenceBand::Top, ConfidenceBand::High, ConfidenceBand::Moderate];

    /// Band for a confidence; `None` below 70
    ///
    /// # Examples
    ///
    /// ```
    /// use factledger_calibration::ConfidenceBand;
    ///
    /// assert_eq!(ConfidenceBand::of(97), Some(ConfidenceBand::Top));
    /// assert_eq!(ConfidenceBand::of(85), Some(ConfidenceBand::High));
    /// assert_eq!(ConfidenceBand::of(69), None);
    /// ```
    pub fn of(confidence: u8) -> Option<Self> {
        match confidence {
            95.. => Some(ConfidenceBand::Top),
            85..=94 => Some(ConfidenceBand::High),
            70..=84 => Some(ConfidenceBand::Moderate),
            _ => None,
        }
    }

    /// Inclusive bounds of the band
    pub fn range(&self) -> (u8, u8) {
        match self {
            ConfidenceBand::Top => (95, 100),
            ConfidenceBand::High => (85, 94),
            ConfidenceBand::Moderate => (70, 84),
        }
    }

    fn index(&self) -> usize {
        match self {
            ConfidenceBand::Top => 0,
            ConfidenceBand::High => 1,
            ConfidenceBand::Moderate => 2,
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (low, high) = self.range();
        write!(f, "{}-{}", low, high)
    }
}

/// Counts for one confidence band
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BandStats {
    /// System-created events in the band
    pub total: usize,

    /// Of those, events later superseded by a BA_OVERRIDE event
    pub overridden: usize,

    /// Override rate above the band's ceiling with enough samples
    pub over_confident: bool,
}

impl BandStats {
    /// Fraction of the band's events that were overridden
    pub fn override_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.overridden as f64 / self.total as f64
        }
    }
}

/// Result of one calibration run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    /// Start of the analysed window (inclusive)
    pub window_start: DateTime<Utc>,

    /// End of the analysed window (exclusive)
    pub window_end: DateTime<Utc>,

    bands: [BandStats; 3],

    /// Events whose confidence fell below every band
    pub unbanded: usize,
}

impl CalibrationReport {
    /// Create an empty report for a window
    pub fn new(window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Self {
        Self {
            window_start,
            window_end,
            bands: Default::default(),
            unbanded: 0,
        }
    }

    /// Record one system-reported confidence and whether it was overridden
    pub fn record(&mut self, confidence: u8, overridden: bool) {
        match ConfidenceBand::of(confidence) {
            Some(band) => {
                let stats = &mut self.bands[band.index()];
                stats.total += 1;
                if overridden {
                    stats.overridden += 1;
                }
            }
            None => self.unbanded += 1,
        }
    }

    /// Set each band's `over_confident` flag against the configured ceilings
    pub fn flag(&mut self, config: &CalibrationConfig) {
        for band in ConfidenceBand::ALL {
            let stats = &mut self.bands[band.index()];
            stats.over_confident = stats.total >= config.min_sample_size
                && stats.override_rate() > config.max_override_rate(band);
        }
    }

    /// Figures for one band
    pub fn band(&self, band: ConfidenceBand) -> &BandStats {
        &self.bands[band.index()]
    }

    /// Bands flagged as over-confident, highest first
    pub fn over_confident_bands(&self) -> Vec<ConfidenceBand> {
        ConfidenceBand::ALL
            .into_iter()
            .filter(|b| self.band(*b).over_confident)
            .collect()
    }

    /// Banded events across all bands
    pub fn total_events(&self) -> usize {
        self.bands.iter().map(|s| s.total).sum()
    }

    /// Overridden events across all bands
    pub fn total_overridden(&self) -> usize {
        self.bands.iter().map(|s| s.overridden).sum()
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Calibration Summary".to_string(),
            "===================".to_string(),
            format!(
                "Window: {} to {}",
                self.window_start.format("%Y-%m-%d %H:%M"),
                self.window_end.format("%Y-%m-%d %H:%M")
            ),
            format!("Banded events: {}", self.total_events()),
            format!("Overridden: {}", self.total_overridden()),
            format!("Below 70: {}", self.unbanded),
            String::new(),
            "Override rate by band:".to_string(),
        ];

        for band in ConfidenceBand::ALL {
            let stats = self.band(band);
            let flag = if stats.over_confident { "  OVER-CONFIDENT" } else { "" };
            lines.push(format!(
                "  {:>6}: {}/{} ({:.1}%){}",
                band.to_string(),
                stats.overridden,
                stats.total,
                stats.override_rate() * 100.0,
                flag
            ));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> CalibrationReport {
        let now = Utc::now();
        CalibrationReport::new(now - chrono::Duration::days(30), now)
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(ConfidenceBand::of(100), Some(ConfidenceBand::Top));
        assert_eq!(ConfidenceBand::of(95), Some(ConfidenceBand::Top));
        assert_eq!(ConfidenceBand::of(94), Some(ConfidenceBand::High));
        assert_eq!(ConfidenceBand::of(84), Some(ConfidenceBand::Moderate));
        assert_eq!(ConfidenceBand::of(70), Some(ConfidenceBand::Moderate));
        assert_eq!(ConfidenceBand::of(0), None);
        assert_eq!(ConfidenceBand::Top.to_string(), "95-100");
    }

    #[test]
    fn test_record_and_totals() {
        let mut report = report();
        report.record(98, true);
        report.record(96, false);
        report.record(90, false);
        report.record(40, true);

        assert_eq!(report.band(ConfidenceBand::Top).total, 2);
        assert_eq!(report.band(ConfidenceBand::Top).overridden, 1);
        assert_eq!(report.band(ConfidenceBand::Top).override_rate(), 0.5);
        assert_eq!(report.band(ConfidenceBand::Moderate).total, 0);
        assert_eq!(report.total_events(), 3);
        assert_eq!(report.total_overridden(), 1);
        assert_eq!(report.unbanded, 1);
    }

    #[test]
    fn test_empty_band_rate_is_zero() {
        assert_eq!(BandStats::default().override_rate(), 0.0);
    }

    #[test]
    fn test_flag_respects_sample_size() {
        let config = CalibrationConfig {
            min_sample_size: 4,
            ..CalibrationConfig::default()
        };
        let mut report = report();
        for overridden in [true, false, false] {
            report.record(99, overridden);
        }
        report.flag(&config);
        assert!(report.over_confident_bands().is_empty(), "3 samples is too few");

        report.record(99, false);
        report.flag(&config);
        assert_eq!(report.over_confident_bands(), vec![ConfidenceBand::Top]);
    }

    #[test]
    fn test_summary() {
        let mut report = report();
        report.record(72, true);
        let summary = report.summary();
        assert!(summary.contains("Calibration Summary"));
        assert!(summary.contains("70-84: 1/1 (100.0%)"));
        assert!(!summary.contains("OVER-CONFIDENT"));
    }
}
