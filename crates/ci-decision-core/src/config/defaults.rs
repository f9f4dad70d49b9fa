//! Default configuration values

use std::collections::BTreeMap;

use super::types::{CacheMount, Config};

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "ci-decision.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "ci-decision.yaml";

/// Directory holding the in-tree dockerfiles
pub const DEFAULT_DOCKERFILE_DIR: &str = "etc/ci/taskcluster";

/// Three hours
pub const DEFAULT_MAX_RUN_TIME_MINUTES: u32 = 3 * 60;

/// See https://docs.taskcluster.net/docs/reference/workers/docker-worker/docs/caches
pub const CACHE_SCOPE_PREFIX: &str = "docker-worker:cache";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".ci-decision.toml",
        ".ci-decision.yaml",
    ]
}

/// Cargo registry and git caches
pub fn cargo_cache() -> Vec<CacheMount> {
    vec![
        CacheMount::new("cargo-registry-cache", "/root/.cargo/registry"),
        CacheMount::new("cargo-git-cache", "/root/.cargo/git"),
    ]
}

/// Environment for build jobs
pub fn build_env() -> BTreeMap<String, String> {
    [
        ("RUST_BACKTRACE", "1"),
        ("RUSTFLAGS", "-Dwarnings"),
        ("CARGO_INCREMENTAL", "0"),
        ("SCCACHE_IDLE_TIMEOUT", "1200"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Generate default configuration TOML
pub fn default_config_toml() -> String {
    toml::to_string_pretty(&Config::default())
        .unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# ci-decision configuration

dockerfile_dir = "etc/ci/taskcluster"
max_run_time_minutes = 180

[project]
name = "Servo"
route_prefix = "project.servo.servo"
docker_image_cache_expiry = "1 week"
worker_type = "servo-docker-worker"
provisioner_id = "aws-provisioner-v1"
deadline_in = "1 day"

[cache]
scope_prefix = "docker-worker:cache"

[[cache.mounts]]
name = "cargo-registry-cache"
path = "/root/.cargo/registry"

[[cache.mounts]]
name = "cargo-git-cache"
path = "/root/.cargo/git"

[build_env]
CARGO_INCREMENTAL = "0"
RUSTFLAGS = "-Dwarnings"
RUST_BACKTRACE = "1"
SCCACHE_IDLE_TIMEOUT = "1200"
"#;
