//! CI backends that register rendered tasks
//!
//! Provides:
//! - [`RecordingBackend`]: keeps tasks in memory
//! - [`StdoutBackend`]: prints each task as JSON
//! - [`ManifestBackend`]: writes the whole task graph to a file

use serde::{Deserialize, Serialize};

use crate::decision::RenderedTask;
use crate::error::Result;

mod manifest;
mod recording;
mod stdout;

pub use manifest::{Manifest, ManifestBackend};
pub use recording::RecordingBackend;
pub use stdout::StdoutBackend;

/// A task accepted by a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTask {
    /// Id the task was registered under
    pub task_id: String,
    /// Full display name
    pub name: String,
}

impl SubmittedTask {
    /// Describe a rendered task
    pub fn from_task(task: &RenderedTask) -> Self {
        Self {
            task_id: task.task_id.clone(),
            name: task.metadata.name.clone(),
        }
    }
}

/// Capability to register a task with a CI service
pub trait CiBackend {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Register one task.
    ///
    /// Errors are returned as-is so the decision run stops immediately.
    fn create_task(&mut self, task: &RenderedTask) -> Result<SubmittedTask>;
}
