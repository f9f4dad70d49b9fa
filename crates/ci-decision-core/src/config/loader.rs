//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ConfigError, DecisionError, Result};

use super::defaults::config_file_names;
use super::types::Config;
use super::validation::validate_config;

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    let format = if path
        .extension()
        .is_some_and(|e| e == "yaml" || e == "yml")
    {
        "YAML"
    } else {
        "TOML"
    };
    info!(path = %path.display(), format, "loading config");

    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()).into());
    }
    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: Config = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// At each directory level the search checks `<dir>/<name>` and then
/// `<dir>/.github/<name>`. The first match wins.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.is_file() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let github_path = current.join(".github").join(name);
            if github_path.is_file() {
                info!(path = %github_path.display(), "found config file in .github/");
                return Some(github_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load configuration from directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

/// Load configuration, falling back to defaults when no file exists.
///
/// A file that exists but fails to parse or validate is still an error.
pub fn load_config_or_default(dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    match load_config_from_dir(dir) {
        Ok((config, path)) => Ok((config, Some(path))),
        Err(DecisionError::Config(ConfigError::NotFound(_))) => {
            warn!(dir = %dir.display(), "no config found, using defaults");
            Ok((Config::default(), None))
        }
        Err(e) => Err(e),
    }
}

/// Resolve the dockerfile directory against the config file location
pub fn resolve_dockerfile_dir(config: &Config, config_path: Option<&Path>, cwd: &Path) -> PathBuf {
    if config.dockerfile_dir.is_absolute() {
        return config.dockerfile_dir.clone();
    }

    // Configs kept in .github/ describe the repository root, not .github/ itself
    let base = match config_path.and_then(Path::parent) {
        Some(parent) if parent.file_name().is_some_and(|n| n == ".github") => {
            parent.parent().unwrap_or(parent)
        }
        Some(parent) => parent,
        None => cwd,
    };
    base.join(&config.dockerfile_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ci-decision.toml");
        std::fs::write(&config_path, "[project]\nname = \"Demo\"").unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ci-decision.toml");
        std::fs::write(&config_path, "[project]\nname = \"Demo\"").unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config(&nested), Some(config_path));
    }

    #[test]
    fn test_find_config_in_github_dir() {
        let temp = TempDir::new().unwrap();
        let github_dir = temp.path().join(".github");
        std::fs::create_dir_all(&github_dir).unwrap();
        let config_path = github_dir.join("ci-decision.yaml");
        std::fs::write(&config_path, "project:\n  name: Demo\n").unwrap();

        assert_eq!(find_config(temp.path()), Some(config_path));
    }

    #[test]
    fn test_load_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ci-decision.yaml");
        std::fs::write(
            &config_path,
            "project:\n  name: Demo\n  worker_type: demo-worker\nmax_run_time_minutes: 60\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.project.name, "Demo");
        assert_eq!(config.project.worker_type, "demo-worker");
        assert_eq!(config.max_run_time_minutes, 60);
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ci-decision.toml");
        std::fs::write(
            &config_path,
            "[project]\ndocker_image_cache_expiry = \"whenever\"\n",
        )
        .unwrap();

        assert!(load_config(&config_path).is_err());
    }

    #[test]
    fn test_load_config_or_default_without_file() {
        let temp = TempDir::new().unwrap();
        let (config, path) = load_config_or_default(temp.path()).unwrap();
        assert!(path.is_none());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_or_default_propagates_parse_errors() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("ci-decision.toml"), "project = [").unwrap();

        assert!(load_config_or_default(temp.path()).is_err());
    }

    #[test]
    fn test_resolve_dockerfile_dir() {
        let config = Config::default();
        let cwd = Path::new("/work");

        assert_eq!(
            resolve_dockerfile_dir(&config, None, cwd),
            PathBuf::from("/work/etc/ci/taskcluster")
        );
        assert_eq!(
            resolve_dockerfile_dir(&config, Some(Path::new("/repo/ci-decision.toml")), cwd),
            PathBuf::from("/repo/etc/ci/taskcluster")
        );
        assert_eq!(
            resolve_dockerfile_dir(
                &config,
                Some(Path::new("/repo/.github/ci-decision.toml")),
                cwd
            ),
            PathBuf::from("/repo/etc/ci/taskcluster")
        );
    }
}
