//! Validate command

use clap::Args;
use console::style;
use tracing::info;

use ci_decision_core::{DecisionError, TaskError};

use super::Workspace;
use crate::cli::{output, Cli, OutputFormat};

/// Check configuration and every task descriptor without submitting
#[derive(Debug, Args)]
pub struct ValidateCommand {}

impl ValidateCommand {
    /// Execute the validate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing validate command");
        let workspace = Workspace::load(cli)?;
        let builder = workspace.builder();

        let descriptors = builder.descriptors();
        let mut failures: Vec<TaskError> = descriptors
            .iter()
            .filter_map(|descriptor| descriptor.validate().err())
            .collect();
        let errors: Vec<String> = failures.iter().map(ToString::to_string).collect();

        match cli.format {
            OutputFormat::Json => {
                let result = serde_json::json!({
                    "valid": errors.is_empty(),
                    "config_path": workspace
                        .config_path
                        .as_ref()
                        .map(|p| p.display().to_string()),
                    "dockerfile_dir": workspace.dockerfile_dir.display().to_string(),
                    "tasks": descriptors.iter().map(|d| &d.name).collect::<Vec<_>>(),
                    "errors": errors,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            OutputFormat::Text if !cli.quiet => {
                match &workspace.config_path {
                    Some(path) => output::info(&format!(
                        "Config: {}",
                        output::path_style().apply_to(path.display())
                    )),
                    None => output::info("Config: defaults"),
                }
                for descriptor in &descriptors {
                    eprintln!("  {} {}", style("▸").dim(), descriptor.name);
                }
                for error in &errors {
                    eprintln!("  {} {}", style("✗").red(), error);
                }
            }
            OutputFormat::Text => {}
        }

        if !failures.is_empty() {
            let count = failures.len();
            let first = failures.remove(0);
            return Err(anyhow::Error::from(DecisionError::from(first)).context(format!(
                "{} of {} tasks are invalid",
                count,
                descriptors.len()
            )));
        }

        if !cli.quiet && cli.format == OutputFormat::Text {
            output::success("All tasks are valid");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::tests::fixture;
    use crate::exit_codes;

    #[test]
    fn test_validate_passes_with_dockerfile() {
        let (_temp, cli) = fixture();
        assert!(ValidateCommand {}.execute(&cli).is_ok());
    }

    #[test]
    fn test_missing_dockerfile_is_a_task_error() {
        let (temp, cli) = fixture();
        std::fs::remove_file(temp.path().join("docker").join("build-x86_64-linux.dockerfile"))
            .unwrap();

        let err = ValidateCommand {}.execute(&cli).unwrap_err();
        assert_eq!(exit_codes::for_error(&err), exit_codes::TASK_ERROR);
        assert!(err.to_string().contains("2 of 2 tasks are invalid"));
    }
}
