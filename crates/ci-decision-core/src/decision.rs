//! Submission context for decision tasks
//!
//! A [`DecisionTask`] carries the project identity and worker routing shared
//! by every job of a run. It checks each [`TaskDescriptor`], renders it into
//! a [`RenderedTask`] and hands the result to a [`CiBackend`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::backend::{CiBackend, SubmittedTask};
use crate::config::ProjectConfig;
use crate::descriptor::TaskDescriptor;
use crate::error::Result;
use crate::time::from_now;

/// Task group used when no `TASK_ID` is available
pub const LOCAL_TASK_GROUP: &str = "local";

/// Shell used to run job scripts
const SHELL_PREFIX: [&str; 5] = ["/bin/bash", "--login", "-x", "-e", "-c"];

/// Length of generated task ids
const TASK_ID_LEN: usize = 22;

/// Repository the decision task runs for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Clone URL
    pub git_url: Option<String>,
    /// Commit being tested
    pub git_sha: Option<String>,
}

impl RepositoryInfo {
    /// Read `GIT_URL` and `GIT_SHA` from the environment
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            git_url: read("GIT_URL"),
            git_sha: read("GIT_SHA"),
        }
    }

    /// Variables exported to every job
    fn env(&self) -> impl Iterator<Item = (String, String)> + '_ {
        [("GIT_URL", &self.git_url), ("GIT_SHA", &self.git_sha)]
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
    }
}

/// Identity and routing shared by all tasks of one decision run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionContext {
    /// Display name, prefixed to task names
    pub project_name: String,
    /// Namespace for index routes
    pub route_prefix: String,
    /// Lifetime of cached docker images
    pub docker_image_cache_expiry: String,
    /// Worker pool running the jobs
    pub worker_type: String,
    /// Provisioner owning the worker pool
    pub provisioner_id: String,
    /// Scheduling deadline relative to creation
    pub deadline_in: String,
    /// Task group the jobs belong to
    pub task_group_id: String,
    /// Repository under test
    pub repository: RepositoryInfo,
    /// Creation time stamped on every task of the run
    pub now: DateTime<Utc>,
}

impl DecisionContext {
    /// Create a context for a project
    pub fn new(
        project_name: impl Into<String>,
        route_prefix: impl Into<String>,
        docker_image_cache_expiry: impl Into<String>,
        worker_type: impl Into<String>,
    ) -> Self {
        let defaults = ProjectConfig::default();
        Self {
            project_name: project_name.into(),
            route_prefix: route_prefix.into(),
            docker_image_cache_expiry: docker_image_cache_expiry.into(),
            worker_type: worker_type.into(),
            provisioner_id: defaults.provisioner_id,
            deadline_in: defaults.deadline_in,
            task_group_id: LOCAL_TASK_GROUP.to_string(),
            repository: RepositoryInfo::default(),
            now: Utc::now().trunc_subsecs(3),
        }
    }

    /// Create a context from the project section of the configuration
    pub fn from_config(project: &ProjectConfig) -> Self {
        Self::new(
            &project.name,
            &project.route_prefix,
            &project.docker_image_cache_expiry,
            &project.worker_type,
        )
        .with_provisioner_id(&project.provisioner_id)
        .with_deadline_in(&project.deadline_in)
    }

    /// Set the task group id
    pub fn with_task_group_id(mut self, task_group_id: impl Into<String>) -> Self {
        self.task_group_id = task_group_id.into();
        self
    }

    /// Set the provisioner id
    pub fn with_provisioner_id(mut self, provisioner_id: impl Into<String>) -> Self {
        self.provisioner_id = provisioner_id.into();
        self
    }

    /// Set the scheduling deadline
    pub fn with_deadline_in(mut self, deadline_in: impl Into<String>) -> Self {
        self.deadline_in = deadline_in.into();
        self
    }

    /// Set the repository information
    pub fn with_repository(mut self, repository: RepositoryInfo) -> Self {
        self.repository = repository;
        self
    }

    /// Pin the creation time
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Full display name of a job
    pub fn task_name(&self, name: &str) -> String {
        format!("{}: {}", self.project_name, name)
    }

    /// Stable id for a job within this task group
    pub fn task_id(&self, name: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.task_group_id.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.task_name(name).as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..TASK_ID_LEN].to_string()
    }

    /// Index path under which an image with this hash is cached
    pub fn docker_image_index_path(&self, image_hash: &str) -> String {
        format!("{}.docker-image.{}", self.route_prefix, image_hash)
    }
}

/// Task metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// Full display name
    pub name: String,
    /// Repository URL, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Docker image built from an in-tree dockerfile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerImage {
    /// Dockerfile the image is built from
    pub dockerfile: PathBuf,
    /// SHA-256 of the dockerfile contents
    pub sha256: String,
    /// Index path of the cached image
    pub index_path: String,
    /// When the cached image expires
    pub expires: DateTime<Utc>,
}

/// Worker payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    /// Image the job runs in
    pub image: DockerImage,
    /// Program and arguments
    pub command: Vec<String>,
    /// Process environment
    pub env: BTreeMap<String, String>,
    /// Cache name to mount path
    pub cache: BTreeMap<String, String>,
    /// Maximum run time in seconds
    pub max_run_time: u64,
}

/// A task definition ready for a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedTask {
    pub task_id: String,
    pub task_group_id: String,
    pub provisioner_id: String,
    pub worker_type: String,
    pub created: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub scopes: Vec<String>,
    pub metadata: TaskMetadata,
    pub payload: TaskPayload,
}

impl RenderedTask {
    /// The job script passed to the shell
    pub fn script(&self) -> &str {
        self.payload
            .command
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Submission context: renders descriptors and registers them with a backend
pub struct DecisionTask<B: CiBackend> {
    context: DecisionContext,
    backend: B,
    submitted: Vec<SubmittedTask>,
}

impl<B: CiBackend> DecisionTask<B> {
    /// Create a new submission context
    pub fn new(context: DecisionContext, backend: B) -> Self {
        info!(
            project = %context.project_name,
            worker_type = %context.worker_type,
            task_group_id = %context.task_group_id,
            backend = backend.name(),
            "decision task created"
        );
        Self {
            context,
            backend,
            submitted: Vec::new(),
        }
    }

    /// The shared context
    pub fn context(&self) -> &DecisionContext {
        &self.context
    }

    /// The backend tasks are registered with
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Consume the context and return the backend
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Tasks registered so far, in submission order
    pub fn submitted(&self) -> &[SubmittedTask] {
        &self.submitted
    }

    /// Check a descriptor and render it without submitting
    pub fn render(&self, descriptor: &TaskDescriptor) -> Result<RenderedTask> {
        descriptor.validate()?;

        let contents = std::fs::read(&descriptor.dockerfile_path)?;
        let image_hash = format!("{:x}", Sha256::digest(&contents));
        debug!(
            dockerfile = %descriptor.dockerfile_path.display(),
            hash = %image_hash,
            "hashed dockerfile"
        );

        let ctx = &self.context;
        let image = DockerImage {
            dockerfile: descriptor.dockerfile_path.clone(),
            index_path: ctx.docker_image_index_path(&image_hash),
            sha256: image_hash,
            expires: from_now(&ctx.docker_image_cache_expiry, ctx.now)?,
        };

        let mut command: Vec<String> = SHELL_PREFIX.iter().map(|s| s.to_string()).collect();
        command.push(descriptor.script());

        let mut env = descriptor.environment.clone();
        env.extend(ctx.repository.env());

        Ok(RenderedTask {
            task_id: ctx.task_id(&descriptor.name),
            task_group_id: ctx.task_group_id.clone(),
            provisioner_id: ctx.provisioner_id.clone(),
            worker_type: ctx.worker_type.clone(),
            created: ctx.now,
            deadline: from_now(&ctx.deadline_in, ctx.now)?,
            scopes: descriptor.scopes.clone(),
            metadata: TaskMetadata {
                name: ctx.task_name(&descriptor.name),
                source: ctx.repository.git_url.clone(),
            },
            payload: TaskPayload {
                image,
                command,
                env,
                cache: descriptor.cache_mounts.clone(),
                max_run_time: u64::from(descriptor.max_run_time_minutes) * 60,
            },
        })
    }

    /// Register a job whose image is built from a dockerfile in the repository
    pub fn create_task_with_in_tree_dockerfile(
        &mut self,
        descriptor: &TaskDescriptor,
    ) -> Result<SubmittedTask> {
        let task = self.render(descriptor)?;
        info!(
            task_id = %task.task_id,
            name = %task.metadata.name,
            backend = self.backend.name(),
            "submitting task"
        );

        let submitted = self.backend.create_task(&task)?;
        self.submitted.push(submitted.clone());
        Ok(submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn context() -> DecisionContext {
        DecisionContext::new(
            "Servo",
            "project.servo.servo",
            "1 week",
            "servo-docker-worker",
        )
        .with_task_group_id("group-1")
        .with_now(Utc.with_ymd_and_hms(2018, 9, 1, 12, 0, 0).unwrap())
    }

    fn descriptor(dir: &TempDir) -> TaskDescriptor {
        let path = dir.path().join("build-x86_64-linux.dockerfile");
        std::fs::write(&path, "FROM ubuntu:bionic-20180821\n").unwrap();
        let command = "\n    ./mach test-tidy --no-progress --all\n";
        TaskDescriptor::new("tidy", command, path, 180)
            .with_env(BTreeMap::from([(
                "RUST_BACKTRACE".to_string(),
                "1".to_string(),
            )]))
            .with_cache(BTreeMap::from([(
                "cargo-git-cache".to_string(),
                "/root/.cargo/git".to_string(),
            )]))
    }

    #[test]
    fn test_render_task() {
        let temp = TempDir::new().unwrap();
        let decision = DecisionTask::new(context(), RecordingBackend::new());
        let task = decision.render(&descriptor(&temp)).unwrap();

        assert_eq!(task.metadata.name, "Servo: tidy");
        assert_eq!(task.task_group_id, "group-1");
        assert_eq!(task.worker_type, "servo-docker-worker");
        assert_eq!(task.provisioner_id, "aws-provisioner-v1");
        assert_eq!(task.payload.max_run_time, 180 * 60);
        assert_eq!(task.script(), "./mach test-tidy --no-progress --all");
        assert_eq!(&task.payload.command[..5], &SHELL_PREFIX);
        assert_eq!(task.payload.cache["cargo-git-cache"], "/root/.cargo/git");
        assert_eq!(
            task.deadline,
            Utc.with_ymd_and_hms(2018, 9, 2, 12, 0, 0).unwrap()
        );
        assert_eq!(
            task.payload.image.expires,
            Utc.with_ymd_and_hms(2018, 9, 8, 12, 0, 0).unwrap()
        );
        assert_eq!(task.payload.image.sha256.len(), 64);
        assert_eq!(
            task.payload.image.index_path,
            format!("project.servo.servo.docker-image.{}", task.payload.image.sha256)
        );
        assert_eq!(task.task_id.len(), TASK_ID_LEN);
    }

    #[test]
    fn test_render_adds_repository_env() {
        let temp = TempDir::new().unwrap();
        let ctx = context().with_repository(RepositoryInfo {
            git_url: Some("https://github.com/servo/servo".to_string()),
            git_sha: Some("abc123".to_string()),
        });
        let decision = DecisionTask::new(ctx, RecordingBackend::new());
        let task = decision.render(&descriptor(&temp)).unwrap();

        assert_eq!(task.payload.env["GIT_URL"], "https://github.com/servo/servo");
        assert_eq!(task.payload.env["GIT_SHA"], "abc123");
        assert_eq!(task.payload.env["RUST_BACKTRACE"], "1");
        assert_eq!(
            task.metadata.source.as_deref(),
            Some("https://github.com/servo/servo")
        );
    }

    #[test]
    fn test_task_id_is_stable() {
        let ctx = context();
        assert_eq!(ctx.task_id("tidy"), ctx.task_id("tidy"));
        assert_ne!(ctx.task_id("tidy"), ctx.task_id("build"));
        assert_ne!(
            ctx.task_id("tidy"),
            ctx.clone().with_task_group_id("group-2").task_id("tidy")
        );
    }

    #[test]
    fn test_create_task_records_submission() {
        let temp = TempDir::new().unwrap();
        let mut decision = DecisionTask::new(context(), RecordingBackend::new());
        let submitted = decision
            .create_task_with_in_tree_dockerfile(&descriptor(&temp))
            .unwrap();

        assert_eq!(submitted.name, "Servo: tidy");
        assert_eq!(decision.submitted(), &[submitted]);
        assert_eq!(decision.backend().tasks().len(), 1);
    }

    #[test]
    fn test_create_task_rejects_missing_dockerfile() {
        let temp = TempDir::new().unwrap();
        let mut descriptor = descriptor(&temp);
        descriptor.dockerfile_path = temp.path().join("missing.dockerfile");

        let mut decision = DecisionTask::new(context(), RecordingBackend::new());
        assert!(decision
            .create_task_with_in_tree_dockerfile(&descriptor)
            .is_err());
        assert!(decision.backend().tasks().is_empty());
    }
}
