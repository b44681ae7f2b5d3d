//! Query helpers for extracting data from loaded runs.

use std::collections::BTreeSet;

use hk_sim::{FaultEvent, LogTable};

use crate::error::{AppError, AppResult};

/// Summary of a run's time range and data.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub time_range: (f64, f64),
    pub record_count: usize,
    pub column_count: usize,
    pub agent_count: usize,
    pub fault_count: usize,
}

/// Get run summary from an exported log.
pub fn get_run_summary(log: &LogTable, faults: &[FaultEvent]) -> AppResult<RunSummary> {
    let (Some(first), Some(last)) = (log.rows.first(), log.rows.last()) else {
        return Err(AppError::InvalidInput("No records in run".to_string()));
    };

    Ok(RunSummary {
        time_range: (first.time, last.time),
        record_count: log.rows.len(),
        column_count: log.columns.len(),
        agent_count: list_agent_ids(log).len(),
        fault_count: faults.len(),
    })
}

/// Agent ids that appear in the log's columns, sorted.
pub fn list_agent_ids(log: &LogTable) -> Vec<String> {
    log.columns
        .iter()
        .filter_map(|col| col.rsplit_once('.').map(|(agent, _)| agent.to_string()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// `(time, value)` pairs for one `"agent.attr"` column. Ticks where the
/// agent was no longer alive yield `None`.
pub fn extract_series(log: &LogTable, column: &str) -> AppResult<Vec<(f64, Option<f64>)>> {
    if !log.columns.iter().any(|c| c == column) {
        return Err(AppError::InvalidInput(format!("Unknown column: {column}")));
    }
    Ok(log
        .rows
        .iter()
        .map(|row| (row.time, row.values.get(column).copied().flatten()))
        .collect())
}
