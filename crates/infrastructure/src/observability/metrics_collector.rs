//! Metrics collector for the job scheduler
//!
//! Counters and histograms are labeled with the job key (`group.name`) so that
//! a single job's fire rate, failures and skipped fires can be followed.

use metrics::{counter, gauge, histogram, Gauge};
use scheduler_core::models::JobKey;
use tracing::{debug, warn};

/// Metrics collector for the job scheduler
pub struct MetricsCollector {
    jobs_registered: Gauge,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            jobs_registered: gauge!("scheduler_jobs_registered"),
        }
    }

    /// Record that a job was claimed and handed to its handler
    pub fn record_job_fired(&self, key: &JobKey) {
        counter!("scheduler_job_fires_total", "job" => key.to_string()).increment(1);
    }

    /// Record a finished execution
    pub fn record_job_completed(&self, key: &JobKey, success: bool, duration_seconds: f64) {
        let job = key.to_string();
        histogram!("scheduler_job_execution_duration_seconds", "job" => job.clone())
            .record(duration_seconds);

        if success {
            debug!(
                job = %key,
                duration_seconds = duration_seconds,
                "Job execution completed"
            );
        } else {
            counter!("scheduler_job_failures_total", "job" => job).increment(1);
            warn!(
                job = %key,
                duration_seconds = duration_seconds,
                "Job execution failed"
            );
        }
    }

    /// Record a fire dropped because the previous one was still running
    pub fn record_job_skipped(&self, key: &JobKey) {
        counter!("scheduler_job_skipped_total", "job" => key.to_string()).increment(1);
    }

    /// Record fire times skipped by the do-nothing misfire policy
    pub fn record_job_misfired(&self, key: &JobKey, missed: u64) {
        if missed > 0 {
            counter!("scheduler_job_misfires_total", "job" => key.to_string()).increment(missed);
        }
    }

    /// Update the number of jobs currently in the store
    pub fn update_registered_jobs(&self, count: usize) {
        self.jobs_registered.set(count as f64);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
