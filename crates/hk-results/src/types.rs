//! Result data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hk_sim::RunReport;

pub type RunId = String;

/// Metadata written next to every stored run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunManifest {
    pub run_id: RunId,
    pub created_at: DateTime<Utc>,
    pub kernel_version: String,
    pub total_ticks: u64,
    pub ticks_completed: u64,
    pub dt: f64,
    #[serde(default)]
    pub cancelled: bool,
    /// Agents that failed during the run, in failure order.
    #[serde(default)]
    pub failed_agents: Vec<String>,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl RunManifest {
    pub fn from_report(run_id: impl Into<RunId>, kernel_version: &str, report: &RunReport) -> Self {
        Self {
            run_id: run_id.into(),
            created_at: Utc::now(),
            kernel_version: kernel_version.to_string(),
            total_ticks: report.total_ticks,
            ticks_completed: report.ticks_completed,
            dt: report.dt,
            cancelled: report.cancelled,
            failed_agents: report
                .failed_agents()
                .into_iter()
                .map(|id| id.to_string())
                .collect(),
            columns: report.logger.export().columns,
        }
    }

    /// Only complete runs are served from the cache.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.ticks_completed == self.total_ticks
    }
}
