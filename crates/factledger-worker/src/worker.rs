//! Background worker for snapshot refresh and calibration

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use factledger_calibration::{CalibrationAnalyzer, CalibrationReport};
use tokio::time::{interval, MissedTickBehavior};

use crate::{RefreshReport, ViewRefresher, WorkerConfig, WorkerError};

/// Counters collected across the worker's lifetime
#[derive(Debug, Clone, Default)]
pub struct WorkerMetrics {
    /// Refresh passes completed
    pub refresh_runs: usize,

    /// Deal snapshots rewritten
    pub deals_refreshed: usize,

    /// Deal snapshots that failed to refresh
    pub refresh_failures: usize,

    /// Calibration runs completed
    pub calibration_runs: usize,

    /// Calibration runs that failed
    pub calibration_failures: usize,

    /// Report of the latest successful calibration run
    pub last_calibration: Option<CalibrationReport>,
}

impl WorkerMetrics {
    fn record_refresh(&mut self, report: &RefreshReport) {
        self.refresh_runs += 1;
        self.deals_refreshed += report.deals_refreshed;
        self.refresh_failures += report.failures.len();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Worker Metrics Summary".to_string(),
            "======================".to_string(),
            format!("Refresh passes: {}", self.refresh_runs),
            format!("Snapshots refreshed: {}", self.deals_refreshed),
            format!("Snapshot failures: {}", self.refresh_failures),
            format!("Calibration runs: {}", self.calibration_runs),
            format!("Calibration failures: {}", self.calibration_failures),
        ];
        if let Some(report) = &self.last_calibration {
            lines.push(String::new());
            lines.push(report.summary());
        }
        lines.join("\n")
    }
}

/// Runs snapshot refresh and calibration on their own schedules
///
/// # Examples
///
/// ```no_run
/// use factledger_worker::{MaintenanceWorker, WorkerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = WorkerConfig::default();
///     let mut worker = MaintenanceWorker::from_config(&config)?;
///
///     // Run indefinitely (until Ctrl+C)
///     worker.run().await?;
///     Ok(())
/// }
/// ```
pub struct MaintenanceWorker {
    refresher: ViewRefresher,
    analyzer: CalibrationAnalyzer,
    refresh_interval: Duration,
    calibration_interval: Duration,
    metrics: WorkerMetrics,
}

impl MaintenanceWorker {
    /// Create a worker over a refresher with explicit intervals
    pub fn new(
        refresher: ViewRefresher,
        analyzer: CalibrationAnalyzer,
        refresh_interval: Duration,
        calibration_interval: Duration,
    ) -> Self {
        Self {
            refresher,
            analyzer,
            refresh_interval,
            calibration_interval,
            metrics: WorkerMetrics::default(),
        }
    }

    /// Open the configured database and build a worker from the file's settings
    pub fn from_config(config: &WorkerConfig) -> Result<Self, WorkerError> {
        config.validate()?;
        let refresher = ViewRefresher::open(&config.worker.database_path)?;
        let analyzer = CalibrationAnalyzer::new(config.calibration.clone())?;
        Ok(Self::new(
            refresher,
            analyzer,
            config.refresh_interval(),
            config.calibration_interval(),
        ))
    }

    /// Get the metrics collected so far
    pub fn metrics(&self) -> &WorkerMetrics {
        &self.metrics
    }

    /// Refresh every snapshot once
    pub fn refresh(&mut self) -> Result<RefreshReport, WorkerError> {
        let report = self.refresher.refresh_all()?;
        self.metrics.record_refresh(&report);
        tracing::info!(
            deals = report.deals_refreshed,
            facts = report.facts_written,
            failures = report.failures.len(),
            "snapshot refresh pass complete"
        );
        Ok(report)
    }

    /// Run calibration once over the window ending now
    pub fn calibrate(&mut self) -> Result<CalibrationReport, WorkerError> {
        match self.analyzer.analyze(self.refresher.store(), Utc::now()) {
            Ok(report) => {
                self.metrics.calibration_runs += 1;
                self.metrics.last_calibration = Some(report.clone());
                Ok(report)
            }
            Err(e) => {
                self.metrics.calibration_failures += 1;
                Err(e.into())
            }
        }
    }

    /// One refresh pass followed by one calibration run
    pub fn run_once(&mut self) -> Result<(), WorkerError> {
        self.refresh()?;
        let report = self.calibrate()?;
        tracing::info!("Calibration:\n{}", report.summary());
        Ok(())
    }

    /// Run indefinitely until a shutdown signal (Ctrl+C) is received
    ///
    /// Both jobs run once at startup. A failing job is logged and retried at
    /// its next tick.
    pub async fn run(&mut self) -> Result<(), WorkerError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` completes
    ///
    /// The shutdown future is created once and polled across every tick, so
    /// a signal that arrives while a job is running stops the worker as soon
    /// as that job returns.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), WorkerError>
    where
        F: Future<Output = ()>,
    {
        let mut refresh_ticker = interval(self.refresh_interval);
        let mut calibration_ticker = interval(self.calibration_interval);
        refresh_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        calibration_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            "Maintenance worker started (refresh: {:?}, calibration: {:?})",
            self.refresh_interval,
            self.calibration_interval
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received, stopping worker");
                    break;
                }
                _ = refresh_ticker.tick() => self.refresh_logged(),
                _ = calibration_ticker.tick() => self.calibrate_logged(),
            }
        }

        tracing::info!("Worker stopped. Final metrics:\n{}", self.metrics.summary());
        Ok(())
    }

    /// Run until `refreshes` refresh passes have completed (useful for testing)
    ///
    /// Calibration keeps its own schedule meanwhile.
    pub async fn run_cycles(&mut self, refreshes: usize) -> Result<(), WorkerError> {
        let mut refresh_ticker = interval(self.refresh_interval);
        let mut calibration_ticker = interval(self.calibration_interval);
        let target = self.metrics.refresh_runs + refreshes;

        tracing::info!(
            "Maintenance worker started for {} refresh passes (refresh: {:?})",
            refreshes,
            self.refresh_interval
        );

        while self.metrics.refresh_runs < target {
            tokio::select! {
                biased;
                _ = calibration_ticker.tick() => self.calibrate_logged(),
                _ = refresh_ticker.tick() => {
                    if let Err(e) = self.refresh() {
                        tracing::error!("Refresh failed: {}", e);
                        return Err(e);
                    }
                }
            }
        }

        Ok(())
    }

    fn refresh_logged(&mut self) {
        if let Err(e) = self.refresh() {
            tracing::error!("Refresh failed: {}", e);
        }
    }

    fn calibrate_logged(&mut self) {
        match self.calibrate() {
            Ok(report) => tracing::debug!("Calibration:\n{}", report.summary()),
            Err(e) => tracing::error!("Calibration failed: {}", e),
        }
    }
}
