//! Backend that writes the task graph to a JSON manifest

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{CiBackend, SubmittedTask};
use crate::decision::RenderedTask;
use crate::error::{BackendError, Result};

/// All tasks of one decision run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub task_group_id: Option<String>,
    pub tasks: Vec<RenderedTask>,
}

/// Collects tasks and writes them out once the run has succeeded
#[derive(Debug)]
pub struct ManifestBackend {
    path: PathBuf,
    manifest: Manifest,
}

impl ManifestBackend {
    /// Create a backend writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            manifest: Manifest {
                task_group_id: None,
                tasks: Vec::new(),
            },
        }
    }

    /// Destination of the manifest
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tasks collected so far
    pub fn tasks(&self) -> &[RenderedTask] {
        &self.manifest.tasks
    }

    /// Write the manifest. Nothing is written unless this is called.
    pub fn finish(self) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.write_failed(e))?;
        }

        let json = serde_json::to_string_pretty(&self.manifest).map_err(BackendError::from)?;
        std::fs::write(&self.path, json).map_err(|e| self.write_failed(e))?;

        info!(
            path = %self.path.display(),
            tasks = self.manifest.tasks.len(),
            "manifest written"
        );
        Ok(self.path)
    }

    fn write_failed(&self, e: std::io::Error) -> BackendError {
        BackendError::WriteFailed {
            target: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

impl CiBackend for ManifestBackend {
    fn name(&self) -> &str {
        "manifest"
    }

    fn create_task(&mut self, task: &RenderedTask) -> Result<SubmittedTask> {
        let group = self
            .manifest
            .task_group_id
            .get_or_insert_with(|| task.task_group_id.clone())
            .clone();
        if group != task.task_group_id {
            return Err(BackendError::Rejected {
                backend: self.name().to_string(),
                task: task.metadata.name.clone(),
                reason: format!(
                    "task group '{}' does not match manifest group '{}'",
                    task.task_group_id, group
                ),
            }
            .into());
        }

        self.manifest.tasks.push(task.clone());
        Ok(SubmittedTask::from_task(task))
    }
}
