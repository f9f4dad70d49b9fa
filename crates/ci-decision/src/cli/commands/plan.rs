//! Plan command

use clap::Args;
use console::style;
use tracing::info;

use ci_decision_core::{DecisionTask, RecordingBackend, RenderedTask};

use super::Workspace;
use crate::cli::{output, Cli, OutputFormat};

/// Show the tasks a run would submit, without registering them
#[derive(Debug, Args)]
pub struct PlanCommand {
    /// Include the full job scripts
    #[arg(long)]
    pub scripts: bool,
}

impl PlanCommand {
    /// Execute the plan command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(scripts = self.scripts, "executing plan command");
        let workspace = Workspace::load(cli)?;
        let builder = workspace.builder();

        let mut decision = DecisionTask::new(workspace.context(cli), RecordingBackend::new());
        builder.run(&mut decision)?;
        let tasks = decision.into_backend().into_tasks();

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    print_plan(&tasks, self.scripts);
                }
            }
        }

        Ok(())
    }
}

fn print_plan(tasks: &[RenderedTask], scripts: bool) {
    println!("{}", output::header(&format!("{} tasks", tasks.len())));

    for task in tasks {
        println!();
        println!("{} {}", style("▸").cyan(), style(&task.metadata.name).bold());
        println!("{}", output::key_value("task id", &task.task_id));
        println!(
            "{}",
            output::key_value(
                "worker",
                &format!("{}/{}", task.provisioner_id, task.worker_type)
            )
        );
        println!(
            "{}",
            output::key_value(
                "dockerfile",
                &task.payload.image.dockerfile.display().to_string()
            )
        );
        println!(
            "{}",
            output::key_value(
                "max run time",
                &format!("{} min", task.payload.max_run_time / 60)
            )
        );
        println!("{}", output::key_value("scopes", &task.scopes.join(", ")));

        let caches: Vec<String> = task
            .payload
            .cache
            .iter()
            .map(|(name, path)| format!("{} -> {}", name, path))
            .collect();
        println!("{}", output::key_value("caches", &caches.join(", ")));

        if !task.payload.env.is_empty() {
            let env: Vec<String> = task
                .payload
                .env
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            println!("{}", output::key_value("env", &env.join(" ")));
        }

        if scripts {
            println!("{}", output::key_value("script", ""));
            for line in task.script().lines() {
                println!("    {}", style(line).dim());
            }
        }
    }
}
