//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::defaults;

/// Main configuration for a decision task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Version of the config schema
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Directory holding the in-tree dockerfiles.
    ///
    /// Relative paths are resolved against the directory the config file
    /// was found in, or the working directory when no file was loaded.
    pub dockerfile_dir: PathBuf,

    /// Default upper bound on job wall-clock duration
    pub max_run_time_minutes: u32,

    /// Project identity and worker routing
    pub project: ProjectConfig,

    /// Persistent caches shared across job runs
    pub cache: CacheConfig,

    /// Environment for build jobs
    pub build_env: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: None,
            dockerfile_dir: PathBuf::from(defaults::DEFAULT_DOCKERFILE_DIR),
            max_run_time_minutes: defaults::DEFAULT_MAX_RUN_TIME_MINUTES,
            project: ProjectConfig::default(),
            cache: CacheConfig::default(),
            build_env: defaults::build_env(),
        }
    }
}

/// Project identity used when creating tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Display name, used as a prefix in task names
    pub name: String,

    /// Namespace for index routes on the CI backend
    pub route_prefix: String,

    /// How long built docker images stay in the index (e.g. "1 week")
    pub docker_image_cache_expiry: String,

    /// Worker pool that runs the jobs
    pub worker_type: String,

    /// Provisioner owning the worker pool
    pub provisioner_id: String,

    /// How long after creation a task may still be scheduled
    pub deadline_in: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "Servo".to_string(),
            route_prefix: "project.servo.servo".to_string(),
            docker_image_cache_expiry: "1 week".to_string(),
            worker_type: "servo-docker-worker".to_string(),
            provisioner_id: "aws-provisioner-v1".to_string(),
            deadline_in: "1 day".to_string(),
        }
    }
}

/// Cache mounts and the scope prefix granting access to them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prefix of the scopes that grant access to each cache
    pub scope_prefix: String,

    /// Caches in the order their scopes are requested
    pub mounts: Vec<CacheMount>,
}

/// A named cache and where it is mounted inside the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMount {
    /// Cache name, also the last segment of its scope
    pub name: String,

    /// Absolute in-container mount path
    pub path: String,
}

impl CacheMount {
    /// Create a cache mount
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            scope_prefix: defaults::CACHE_SCOPE_PREFIX.to_string(),
            mounts: defaults::cargo_cache(),
        }
    }
}

impl CacheConfig {
    /// Scopes required to use every configured cache, in mount order
    pub fn scopes(&self) -> Vec<String> {
        self.mounts
            .iter()
            .map(|mount| format!("{}:{}", self.scope_prefix, mount.name))
            .collect()
    }

    /// Cache name to mount path
    pub fn mount_map(&self) -> BTreeMap<String, String> {
        self.mounts
            .iter()
            .map(|mount| (mount.name.clone(), mount.path.clone()))
            .collect()
    }
}
