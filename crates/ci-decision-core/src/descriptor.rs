//! Task descriptors handed to the submission context

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Declarative description of one CI job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Human-readable job name
    pub name: String,

    /// Shell script run inside the job's container
    pub command: String,

    /// Variables merged into the job's process environment
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Container definition used for the job
    pub dockerfile_path: PathBuf,

    /// Upper bound on wall-clock duration, enforced by the backend
    pub max_run_time_minutes: u32,

    /// Authorization scopes the job may use
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Cache name to in-container mount path
    #[serde(default)]
    pub cache_mounts: BTreeMap<String, String>,
}

impl TaskDescriptor {
    /// Create a new descriptor with no environment, scopes or caches
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        dockerfile_path: impl Into<PathBuf>,
        max_run_time_minutes: u32,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            environment: BTreeMap::new(),
            dockerfile_path: dockerfile_path.into(),
            max_run_time_minutes,
            scopes: Vec::new(),
            cache_mounts: BTreeMap::new(),
        }
    }

    /// Set the environment
    pub fn with_env(mut self, environment: BTreeMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    /// Set the required scopes
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Set the cache mounts
    pub fn with_cache(mut self, cache_mounts: BTreeMap<String, String>) -> Self {
        self.cache_mounts = cache_mounts;
        self
    }

    /// The command with common indentation removed
    pub fn script(&self) -> String {
        deindent(&self.command)
    }

    /// Check the descriptor before it is submitted
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.name.trim().is_empty() {
            return Err(TaskError::EmptyName);
        }

        if self.script().is_empty() {
            return Err(TaskError::EmptyCommand(self.name.clone()));
        }

        if self.max_run_time_minutes == 0 {
            return Err(TaskError::InvalidMaxRunTime {
                task: self.name.clone(),
                minutes: self.max_run_time_minutes,
            });
        }

        for scope in &self.scopes {
            check_scope(scope).map_err(|reason| TaskError::InvalidScope {
                task: self.name.clone(),
                scope: scope.clone(),
                reason,
            })?;
        }

        if !self.dockerfile_path.is_file() {
            return Err(TaskError::DockerfileNotFound {
                task: self.name.clone(),
                path: self.dockerfile_path.clone(),
            });
        }

        Ok(())
    }
}

/// Check a scope string: printable ASCII, with `*` only as the final character
pub fn check_scope(scope: &str) -> Result<(), String> {
    if scope.is_empty() {
        return Err("scope cannot be empty".to_string());
    }

    if let Some(c) = scope.chars().find(|c| !(' '..='~').contains(c)) {
        return Err(format!("contains non-printable character {:?}", c));
    }

    if let Some(pos) = scope.find('*') {
        if pos != scope.len() - 1 {
            return Err("'*' is only allowed at the end".to_string());
        }
    }

    Ok(())
}

/// Remove the leading whitespace shared by every non-blank line and trim
/// surrounding blank lines.
///
/// Lets job scripts be written as indented multi-line literals. Tabs and
/// spaces are never considered equal, so mixed indentation only loses the
/// prefix that really is common.
pub fn deindent(script: &str) -> String {
    let lines: Vec<&str> = script.lines().map(str::trim_end).collect();

    let indent = lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .reduce(common_prefix)
        .unwrap_or("");

    let first = lines.iter().position(|line| !line.is_empty());
    let last = lines.iter().rposition(|line| !line.is_empty());

    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last]
            .iter()
            .map(|line| line.strip_prefix(indent).unwrap_or(*line))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| a.len().min(b.len()));
    &a[..len]
}
