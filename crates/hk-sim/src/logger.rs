//! Append-only per-tick data log.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Logger decimation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    /// Record every N-th tick. The final tick is always recorded.
    pub record_every: u64,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { record_every: 1 }
    }
}

/// One recorded tick: `"agentId.attr"` → value for every alive agent.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub tick: u64,
    pub time: f64,
    pub values: BTreeMap<String, f64>,
}

/// Append-only log of simulation outputs.
#[derive(Debug, Clone, Default)]
pub struct DataLogger {
    config: LoggerConfig,
    records: Vec<LogRecord>,
    columns: BTreeSet<String>,
}

impl DataLogger {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
            columns: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> LoggerConfig {
        self.config
    }

    /// Whether `tick` should be recorded in a run of `total_ticks`.
    pub fn should_record(&self, tick: u64, total_ticks: u64) -> bool {
        let every = self.config.record_every.max(1);
        tick % every == 0 || tick + 1 == total_ticks
    }

    /// Append a record. Ticks must be strictly increasing.
    pub fn record(&mut self, tick: u64, time: f64, values: BTreeMap<String, f64>) -> SimResult<()> {
        if let Some(last) = self.records.last()
            && tick <= last.tick
        {
            return Err(SimError::LogOutOfOrder {
                tick,
                last: last.tick,
            });
        }
        self.columns.extend(values.keys().cloned());
        self.records.push(LogRecord { tick, time, values });
        Ok(())
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records carrying at least one attribute of `agent_id`.
    pub fn entries_for(&self, agent_id: &str) -> usize {
        self.records
            .iter()
            .filter(|record| {
                record
                    .values
                    .keys()
                    .any(|key| key.rsplit_once('.').is_some_and(|(agent, _)| agent == agent_id))
            })
            .count()
    }

    /// Rectangular view: one row per record, one column per key ever logged.
    pub fn export(&self) -> LogTable {
        let columns: Vec<String> = self.columns.iter().cloned().collect();
        let rows = self
            .records
            .iter()
            .map(|record| LogRow {
                tick: record.tick,
                time: record.time,
                values: columns
                    .iter()
                    .map(|col| (col.clone(), record.values.get(col).copied()))
                    .collect(),
            })
            .collect();
        LogTable { columns, rows }
    }
}

/// One exported row. Serializes flat: `{"tick":0,"time":0.0,"A.output":5.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub tick: u64,
    pub time: f64,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

/// Exported log. Cells for agents absent at a tick are `None` (`null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogTable {
    pub columns: Vec<String>,
    pub rows: Vec<LogRow>,
}

impl LogTable {
    /// All cells of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        if !self.columns.iter().any(|c| c == name) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|row| row.values.get(name).copied().flatten())
                .collect(),
        )
    }

    /// CSV with `tick,time,<columns>` header; missing cells are empty.
    /// Fields are quoted when they contain separators or quotes.
    pub fn to_csv(&self) -> SimResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = vec!["tick".to_string(), "time".to_string()];
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;
        for row in &self.rows {
            let mut record = vec![row.tick.to_string(), row.time.to_string()];
            record.extend(self.columns.iter().map(|col| cell(row.values.get(col))));
            writer.write_record(&record)?;
        }
        finish_csv(writer)
    }

    /// CSV of a single column as `time,<column>`. `None` if the column is
    /// not in the table.
    pub fn column_csv(&self, name: &str) -> SimResult<Option<String>> {
        if !self.columns.iter().any(|c| c == name) {
            return Ok(None);
        }
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["time", name])?;
        for row in &self.rows {
            writer.write_record([row.time.to_string(), cell(row.values.get(name))])?;
        }
        finish_csv(writer).map(Some)
    }
}

fn cell(value: Option<&Option<f64>>) -> String {
    match value {
        Some(Some(v)) => v.to_string(),
        _ => String::new(),
    }
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> SimResult<String> {
    let bytes = writer.into_inner().map_err(|err| SimError::Csv {
        message: err.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|err| SimError::Csv {
        message: err.to_string(),
    })
}
