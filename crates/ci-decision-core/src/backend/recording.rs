//! In-memory backend

use tracing::debug;

use super::{CiBackend, SubmittedTask};
use crate::decision::RenderedTask;
use crate::error::{BackendError, Result};

/// Backend that keeps every task it receives
#[derive(Debug, Default)]
pub struct RecordingBackend {
    tasks: Vec<RenderedTask>,
    calls: usize,
    fail_on_call: Option<usize>,
}

impl RecordingBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the call with this zero-based index
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    /// Accepted tasks, in submission order
    pub fn tasks(&self) -> &[RenderedTask] {
        &self.tasks
    }

    /// Consume the backend and return the accepted tasks
    pub fn into_tasks(self) -> Vec<RenderedTask> {
        self.tasks
    }

    /// Number of `create_task` calls, including rejected ones
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl CiBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn create_task(&mut self, task: &RenderedTask) -> Result<SubmittedTask> {
        let call = self.calls;
        self.calls += 1;

        if self.fail_on_call == Some(call) {
            return Err(BackendError::Rejected {
                backend: self.name().to_string(),
                task: task.metadata.name.clone(),
                reason: format!("configured to fail on call {}", call),
            }
            .into());
        }

        debug!(task_id = %task.task_id, call, "recorded task");
        self.tasks.push(task.clone());
        Ok(SubmittedTask::from_task(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fixtures::sample_task;

    #[test]
    fn test_records_in_order() {
        let mut backend = RecordingBackend::new();
        backend.create_task(&sample_task("g", "build")).unwrap();
        backend.create_task(&sample_task("g", "tidy")).unwrap();

        assert_eq!(backend.calls(), 2);
        let names: Vec<_> = backend
            .into_tasks()
            .into_iter()
            .map(|t| t.metadata.name)
            .collect();
        assert_eq!(names, vec!["Servo: build", "Servo: tidy"]);
    }

    #[test]
    fn test_failing_on_call() {
        let mut backend = RecordingBackend::failing_on(1);
        assert!(backend.create_task(&sample_task("g", "build")).is_ok());
        assert!(backend.create_task(&sample_task("g", "tidy")).is_err());
        assert_eq!(backend.calls(), 2);
        assert_eq!(backend.tasks().len(), 1);
    }
}
