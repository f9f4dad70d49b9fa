//! CLI commands

mod completions;
mod init;
mod plan;
mod run;
mod validate;

pub use completions::CompletionsCommand;
pub use init::InitCommand;
pub use plan::PlanCommand;
pub use run::RunCommand;
pub use validate::ValidateCommand;

use std::path::PathBuf;

use tracing::debug;

use ci_decision_core::config::{
    load_config, load_config_or_default, resolve_dockerfile_dir, Config,
};
use ci_decision_core::decision::LOCAL_TASK_GROUP;
use ci_decision_core::{DecisionContext, RepositoryInfo, TaskDefinitionBuilder};

use crate::cli::Cli;

/// Configuration resolved for the current invocation
#[derive(Debug)]
pub(crate) struct Workspace {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub dockerfile_dir: PathBuf,
}

impl Workspace {
    /// Load the configuration named on the command line, or search for one
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;

        let (config, config_path) = match &cli.config {
            Some(path) => (load_config(path)?, Some(path.clone())),
            None => load_config_or_default(&cwd)?,
        };

        let dockerfile_dir = match &cli.dockerfile_dir {
            Some(dir) => cwd.join(dir),
            None => resolve_dockerfile_dir(&config, config_path.as_deref(), &cwd),
        };
        debug!(dockerfile_dir = %dockerfile_dir.display(), "resolved dockerfile directory");

        Ok(Self {
            config,
            config_path,
            dockerfile_dir,
        })
    }

    /// Job builder for this configuration
    pub fn builder(&self) -> TaskDefinitionBuilder {
        TaskDefinitionBuilder::new(&self.config, &self.dockerfile_dir)
    }

    /// Submission context for this run
    pub fn context(&self, cli: &Cli) -> DecisionContext {
        let task_group_id = cli
            .task_group_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| LOCAL_TASK_GROUP.to_string());

        DecisionContext::from_config(&self.config.project)
            .with_task_group_id(task_group_id)
            .with_repository(RepositoryInfo::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    pub(super) fn fixture() -> (TempDir, Cli) {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ci-decision.toml");
        std::fs::write(&config_path, "[project]\nname = \"Demo\"\n").unwrap();

        let dockerfile_dir = temp.path().join("docker");
        std::fs::create_dir_all(&dockerfile_dir).unwrap();
        std::fs::write(
            dockerfile_dir.join("build-x86_64-linux.dockerfile"),
            "FROM ubuntu:bionic-20180821\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "ci-decision".into(),
            "--config".into(),
            config_path.into_os_string(),
            "--dockerfile-dir".into(),
            dockerfile_dir.into_os_string(),
            "--task-group-id".into(),
            "group-1".into(),
        ])
        .unwrap();
        (temp, cli)
    }

    #[test]
    fn test_workspace_load() {
        let (temp, cli) = fixture();
        let workspace = Workspace::load(&cli).unwrap();

        assert_eq!(workspace.config.project.name, "Demo");
        assert_eq!(workspace.dockerfile_dir, temp.path().join("docker"));
        assert!(workspace.builder().validate().is_ok());

        let context = workspace.context(&cli);
        assert_eq!(context.task_group_id, "group-1");
        assert_eq!(context.task_name("tidy"), "Demo: tidy");
    }

    #[test]
    fn test_workspace_load_missing_config_file() {
        let temp = TempDir::new().unwrap();
        let cli = Cli::try_parse_from([
            "ci-decision".into(),
            "--config".into(),
            temp.path().join("absent.toml").into_os_string(),
        ])
        .unwrap();
        assert!(Workspace::load(&cli).is_err());
    }
}
