//! Configuration validation

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::descriptor::check_scope;
use crate::error::{ConfigError, Result};
use crate::time::parse_relative_time;

use super::types::Config;

/// Environment variable names accepted in `build_env`
static ENV_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid regex"));

/// Longest run time a docker worker accepts (one day)
pub const MAX_RUN_TIME_LIMIT_MINUTES: u32 = 24 * 60;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_project(config)?;
    validate_run_time(config)?;
    validate_cache(config)?;
    validate_build_env(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

fn validate_project(config: &Config) -> Result<()> {
    let project = &config.project;

    let required = [
        ("project.name", &project.name),
        ("project.worker_type", &project.worker_type),
        ("project.provisioner_id", &project.provisioner_id),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(invalid(field, "cannot be empty").into());
        }
    }

    if project.route_prefix.split('.').any(str::is_empty) {
        return Err(invalid(
            "project.route_prefix",
            "must be a dot-separated list of non-empty segments",
        )
        .into());
    }

    for (field, value) in [
        (
            "project.docker_image_cache_expiry",
            &project.docker_image_cache_expiry,
        ),
        ("project.deadline_in", &project.deadline_in),
    ] {
        if parse_relative_time(value).is_err() {
            return Err(invalid(
                field,
                format!("'{}' is not a relative time like \"1 week\"", value),
            )
            .into());
        }
    }

    Ok(())
}

fn validate_run_time(config: &Config) -> Result<()> {
    let minutes = config.max_run_time_minutes;
    if minutes == 0 || minutes > MAX_RUN_TIME_LIMIT_MINUTES {
        return Err(invalid(
            "max_run_time_minutes",
            format!("must be between 1 and {}", MAX_RUN_TIME_LIMIT_MINUTES),
        )
        .into());
    }
    Ok(())
}

fn validate_cache(config: &Config) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for mount in &config.cache.mounts {
        if mount.name.trim().is_empty() {
            return Err(invalid("cache.mounts", "cache name cannot be empty").into());
        }
        if !seen.insert(mount.name.as_str()) {
            return Err(invalid(
                format!("cache.mounts.{}", mount.name),
                "cache is listed more than once",
            )
            .into());
        }
        if !mount.path.starts_with('/') {
            return Err(invalid(
                format!("cache.mounts.{}", mount.name),
                "mount path must be absolute",
            )
            .into());
        }
    }

    for scope in config.cache.scopes() {
        check_scope(&scope).map_err(|reason| invalid("cache.scope_prefix", reason))?;
    }

    Ok(())
}

fn validate_build_env(config: &Config) -> Result<()> {
    for key in config.build_env.keys() {
        if !ENV_NAME_REGEX.is_match(key) {
            return Err(invalid(
                format!("build_env.{}", key),
                "not a valid environment variable name",
            )
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheMount;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_worker_type() {
        let mut config = Config::default();
        config.project.worker_type = " ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_route_prefix_segments() {
        let mut config = Config::default();
        config.project.route_prefix = "project..servo".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_expiry() {
        let mut config = Config::default();
        config.project.docker_image_cache_expiry = "forever".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_run_time_bounds() {
        let mut config = Config::default();
        config.max_run_time_minutes = 0;
        assert!(validate_config(&config).is_err());

        config.max_run_time_minutes = MAX_RUN_TIME_LIMIT_MINUTES + 1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_relative_mount() {
        let mut config = Config::default();
        config
            .cache
            .mounts
            .push(CacheMount::new("sccache", "root/.sccache"));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_duplicate_mount() {
        let mut config = Config::default();
        config
            .cache
            .mounts
            .push(CacheMount::new("cargo-git-cache", "/tmp/git"));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_scope_prefix_wildcard() {
        let mut config = Config::default();
        config.cache.scope_prefix = "docker-worker:*".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_env_names() {
        let mut config = Config::default();
        config
            .build_env
            .insert("NOT VALID".to_string(), "1".to_string());
        assert!(validate_config(&config).is_err());
    }
}
