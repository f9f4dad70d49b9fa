//! Run command

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use console::style;
use tracing::info;

use ci_decision_core::{
    CiBackend, DecisionTask, ManifestBackend, StdoutBackend, SubmittedTask, TaskDefinitionBuilder,
};

use super::Workspace;
use crate::cli::{output, Cli, OutputFormat};

/// Default manifest location
const DEFAULT_MANIFEST: &str = "decision-tasks.json";

/// Where submitted tasks are registered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Print each task as a JSON line on stdout
    #[default]
    Stdout,
    /// Write all tasks to a JSON manifest
    Manifest,
}

/// Build the decision tasks and submit them
#[derive(Debug, Default, Args)]
pub struct RunCommand {
    /// Backend that registers the tasks
    #[arg(short, long, value_enum, default_value_t = BackendKind::Stdout)]
    pub backend: BackendKind,

    /// Manifest path for the manifest backend
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RunCommand {
    /// Execute the run command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(backend = ?self.backend, "executing run command");
        let workspace = Workspace::load(cli)?;
        let builder = workspace.builder();
        let context = workspace.context(cli);

        match self.backend {
            BackendKind::Stdout => {
                let decision = DecisionTask::new(context, StdoutBackend::stdout());
                let (submitted, _) = submit(&builder, decision)?;
                if !cli.quiet && cli.format == OutputFormat::Text {
                    output::success(&format!("Submitted {} tasks", submitted.len()));
                }
            }
            BackendKind::Manifest => {
                let path = self
                    .output
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST));
                let backend = ManifestBackend::new(path);
                let decision = DecisionTask::new(context, backend);
                let (submitted, backend) = submit(&builder, decision)?;
                let path = backend.finish()?;
                report(cli, &submitted, &path)?;
            }
        }

        Ok(())
    }
}

fn submit<B: CiBackend>(
    builder: &TaskDefinitionBuilder,
    mut decision: DecisionTask<B>,
) -> anyhow::Result<(Vec<SubmittedTask>, B)> {
    let submitted = builder.run(&mut decision)?;
    Ok((submitted, decision.into_backend()))
}

fn report(cli: &Cli, submitted: &[SubmittedTask], path: &std::path::Path) -> anyhow::Result<()> {
    match cli.format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "manifest": path.display().to_string(),
                "tasks": submitted,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text if !cli.quiet => {
            for task in submitted {
                eprintln!(
                    "  {} {} {}",
                    style("▸").dim(),
                    task.name,
                    style(&task.task_id).dim()
                );
            }
            output::success(&format!(
                "Wrote {} tasks to {}",
                submitted.len(),
                output::path_style().apply_to(path.display())
            ));
        }
        OutputFormat::Text => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::tests::fixture;
    use ci_decision_core::config::Config;
    use ci_decision_core::{DecisionContext, RecordingBackend};

    #[test]
    fn test_manifest_run_writes_both_tasks() {
        let (temp, cli) = fixture();
        let workspace = Workspace::load(&cli).unwrap();
        let path = temp.path().join("out").join("tasks.json");

        let decision = DecisionTask::new(workspace.context(&cli), ManifestBackend::new(&path));
        let (submitted, backend) = submit(&workspace.builder(), decision).unwrap();
        backend.finish().unwrap();

        assert_eq!(submitted.len(), 2);
        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(manifest["taskGroupId"], "group-1");
        assert_eq!(
            manifest["tasks"][0]["metadata"]["name"],
            "Demo: building for Linux x86_64 in dev mode"
        );
        assert_eq!(manifest["tasks"][1]["metadata"]["name"], "Demo: tidy");
    }

    #[test]
    fn test_stdout_run_prints_one_line_per_task() {
        let (_temp, cli) = fixture();
        let workspace = Workspace::load(&cli).unwrap();

        let decision = DecisionTask::new(workspace.context(&cli), StdoutBackend::new(Vec::new()));
        let (submitted, backend) = submit(&workspace.builder(), decision).unwrap();

        let output = String::from_utf8(backend.into_inner()).unwrap();
        assert_eq!(submitted.len(), 2);
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_submit_propagates_backend_failure() {
        let (_temp, cli) = fixture();
        let workspace = Workspace::load(&cli).unwrap();
        let context = DecisionContext::from_config(&Config::default().project);

        let decision = DecisionTask::new(context, RecordingBackend::failing_on(0));
        assert!(submit(&workspace.builder(), decision).is_err());
    }
}
