//! ci-decision core - builds and submits the jobs of a CI decision task
//!
//! This crate provides the task descriptors, the submission context that
//! renders them, the backends that register them, and the configuration
//! that parameterizes a decision run.

pub mod backend;
pub mod config;
pub mod decision;
pub mod descriptor;
pub mod error;
pub mod jobs;
pub mod time;

pub use backend::{CiBackend, ManifestBackend, RecordingBackend, StdoutBackend, SubmittedTask};
pub use decision::{DecisionContext, DecisionTask, RenderedTask, RepositoryInfo};
pub use descriptor::{deindent, TaskDescriptor};
pub use error::{BackendError, ConfigError, DecisionError, Result, TaskError};
pub use jobs::{resolve_dockerfile_path, TaskDefinitionBuilder};
