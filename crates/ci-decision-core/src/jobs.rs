//! The jobs a decision run submits

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::backend::{CiBackend, SubmittedTask};
use crate::config::Config;
use crate::decision::DecisionTask;
use crate::descriptor::TaskDescriptor;
use crate::error::Result;

/// Dockerfile shared by the Linux jobs
pub const LINUX_DOCKERFILE: &str = "build-x86_64-linux";

const BUILD_TASK_NAME: &str = "building for Linux x86_64 in dev mode";
const BUILD_COMMAND: &str = "
    ./mach build --dev
";

const TIDY_TASK_NAME: &str = "tidy";
const TIDY_COMMAND: &str = "
    ./mach test-tidy --no-progress --all
    ./mach test-tidy --no-progress --self-test
";

/// Path of `<name>.dockerfile` inside `dir`. The file is not checked.
pub fn resolve_dockerfile_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.dockerfile", name))
}

/// Builds the fixed set of job descriptors and submits them in order
#[derive(Debug, Clone)]
pub struct TaskDefinitionBuilder {
    dockerfile_dir: PathBuf,
    max_run_time_minutes: u32,
    cache_mounts: BTreeMap<String, String>,
    scopes: Vec<String>,
    build_env: BTreeMap<String, String>,
}

impl TaskDefinitionBuilder {
    /// Create a builder from configuration and a resolved dockerfile directory
    pub fn new(config: &Config, dockerfile_dir: impl Into<PathBuf>) -> Self {
        Self {
            dockerfile_dir: dockerfile_dir.into(),
            max_run_time_minutes: config.max_run_time_minutes,
            cache_mounts: config.cache.mount_map(),
            scopes: config.cache.scopes(),
            build_env: config.build_env.clone(),
        }
    }

    /// Directory the dockerfiles are resolved against
    pub fn dockerfile_dir(&self) -> &Path {
        &self.dockerfile_dir
    }

    /// Path of a dockerfile in the dockerfile directory
    pub fn resolve_dockerfile_path(&self, name: &str) -> PathBuf {
        resolve_dockerfile_path(&self.dockerfile_dir, name)
    }

    fn job(&self, name: &str, command: &str) -> TaskDescriptor {
        TaskDescriptor::new(
            name,
            command,
            self.resolve_dockerfile_path(LINUX_DOCKERFILE),
            self.max_run_time_minutes,
        )
        .with_scopes(self.scopes.clone())
        .with_cache(self.cache_mounts.clone())
    }

    /// Dev-mode build
    pub fn build_task(&self) -> TaskDescriptor {
        self.job(BUILD_TASK_NAME, BUILD_COMMAND)
            .with_env(self.build_env.clone())
    }

    /// Tidy and lint checks
    pub fn tidy_task(&self) -> TaskDescriptor {
        self.job(TIDY_TASK_NAME, TIDY_COMMAND)
    }

    /// All descriptors, in submission order
    pub fn descriptors(&self) -> Vec<TaskDescriptor> {
        vec![self.build_task(), self.tidy_task()]
    }

    /// Check every descriptor without submitting any
    pub fn validate(&self) -> Result<Vec<TaskDescriptor>> {
        let descriptors = self.descriptors();
        for descriptor in &descriptors {
            descriptor.validate()?;
            debug!(task = %descriptor.name, "descriptor is valid");
        }
        Ok(descriptors)
    }

    /// Submit every job through the decision task.
    ///
    /// All descriptors are checked first, so a broken configuration fails
    /// before anything is registered. The first submission error stops the run.
    pub fn run<B: CiBackend>(
        &self,
        decision: &mut DecisionTask<B>,
    ) -> Result<Vec<SubmittedTask>> {
        let descriptors = self.validate()?;
        info!(count = descriptors.len(), "submitting decision tasks");

        let mut submitted = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            submitted.push(decision.create_task_with_in_tree_dockerfile(descriptor)?);
        }

        info!(count = submitted.len(), "all tasks submitted");
        Ok(submitted)
    }
}
