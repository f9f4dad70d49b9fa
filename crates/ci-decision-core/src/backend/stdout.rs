//! Backend that prints tasks as JSON Lines

use std::io::{self, Write};

use super::{CiBackend, SubmittedTask};
use crate::decision::RenderedTask;
use crate::error::{BackendError, Result};

/// Writes each task as a single line of JSON
pub struct StdoutBackend<W: Write> {
    writer: W,
}

impl StdoutBackend<io::Stdout> {
    /// Print to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> StdoutBackend<W> {
    /// Print to any writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the backend and return the writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_task(&mut self, task: &RenderedTask) -> std::result::Result<(), BackendError> {
        serde_json::to_writer(&mut self.writer, task)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> CiBackend for StdoutBackend<W> {
    fn name(&self) -> &str {
        "stdout"
    }

    fn create_task(&mut self, task: &RenderedTask) -> Result<SubmittedTask> {
        self.write_task(task).map_err(|e| BackendError::WriteFailed {
            target: format!("task '{}'", task.metadata.name),
            reason: e.to_string(),
        })?;
        Ok(SubmittedTask::from_task(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fixtures::sample_task;

    #[test]
    fn test_writes_json_per_task() {
        let mut backend = StdoutBackend::new(Vec::new());
        let submitted = backend.create_task(&sample_task("g", "tidy")).unwrap();
        assert_eq!(submitted.name, "Servo: tidy");

        let output = String::from_utf8(backend.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["taskGroupId"], "g");
        assert_eq!(value["metadata"]["name"], "Servo: tidy");
        assert_eq!(value["payload"]["maxRunTime"], 10800);
    }

    #[test]
    fn test_one_line_per_task() {
        let mut backend = StdoutBackend::new(Vec::new());
        backend.create_task(&sample_task("g", "build")).unwrap();
        backend.create_task(&sample_task("g", "tidy")).unwrap();

        let output = String::from_utf8(backend.into_inner()).unwrap();
        let names: Vec<String> = output
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["metadata"]["name"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(names, vec!["Servo: build", "Servo: tidy"]);
    }
}
