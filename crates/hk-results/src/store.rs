//! Run storage API.
//!
//! Layout: `<root>/<run_id>/{manifest.json, log.json, faults.json}`.

use std::fs;
use std::path::{Path, PathBuf};

use hk_sim::{FaultEvent, LogTable};

use crate::types::RunManifest;
use crate::{ResultsError, ResultsResult};

const MANIFEST_FILE: &str = "manifest.json";
const LOG_FILE: &str = "log.json";
const FAULTS_FILE: &str = "faults.json";

#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> ResultsResult<Self> {
        let root_dir = root_dir.into();
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store kept beside a config file, in `.hydrokernel/runs`.
    pub fn for_config(config_path: &Path) -> ResultsResult<Self> {
        let dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::new(dir.join(".hydrokernel").join("runs"))
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> ResultsResult<PathBuf> {
        // Run ids become directory names; keep them to one plain component.
        let plain = !run_id.is_empty()
            && run_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !plain {
            return Err(ResultsError::InvalidRunId {
                run_id: run_id.to_string(),
            });
        }
        Ok(self.root_dir.join(run_id))
    }

    fn existing_file(&self, run_id: &str, name: &str) -> ResultsResult<PathBuf> {
        let path = self.run_dir(run_id)?.join(name);
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        Ok(path)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id)
            .map(|dir| dir.join(MANIFEST_FILE).exists())
            .unwrap_or(false)
    }

    /// Writes the log and faults before the manifest, so a run directory
    /// without a manifest is an interrupted save and is ignored.
    pub fn save_run(
        &self,
        manifest: &RunManifest,
        log: &LogTable,
        faults: &[FaultEvent],
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id)?;
        fs::create_dir_all(&run_dir)?;

        fs::write(run_dir.join(LOG_FILE), serde_json::to_string(log)?)?;
        fs::write(
            run_dir.join(FAULTS_FILE),
            serde_json::to_string_pretty(faults)?,
        )?;
        fs::write(
            run_dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(manifest)?,
        )?;

        tracing::debug!(run_id = %manifest.run_id, rows = log.rows.len(), "run saved");
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let path = self.existing_file(run_id, MANIFEST_FILE)?;
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn load_log(&self, run_id: &str) -> ResultsResult<LogTable> {
        let path = self.existing_file(run_id, LOG_FILE)?;
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn load_faults(&self, run_id: &str) -> ResultsResult<Vec<FaultEvent>> {
        let path = self.existing_file(run_id, FAULTS_FILE)?;
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Manifests of all stored runs, newest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                match self.load_manifest(&run_id) {
                    Ok(manifest) => runs.push(manifest),
                    Err(err) => tracing::debug!(%run_id, %err, "skipping run directory"),
                }
            }
        }

        runs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.run_id.cmp(&b.run_id))
        });
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id)?;
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
