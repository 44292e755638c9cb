use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use semver::Version;
use serde::Deserialize;

/// Deployment targets the checks validate against, loaded from `preflight.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Targets {
    /// State bucket is `<prefix>-<environment>`.
    pub state_bucket_prefix: String,
    pub backup_bucket: String,
    pub required_apis: Vec<String>,
    pub terraform_dir: PathBuf,
    pub min_terraform_version: Version,
    pub env_file: PathBuf,
    /// Only used in the remediation hint for a missing env file.
    pub env_template: PathBuf,
    pub command_timeout_secs: u64,
    /// Timeout for the slower service listing and format-check commands.
    pub slow_command_timeout_secs: u64,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            state_bucket_prefix: "keystone-terraform-state".to_string(),
            backup_bucket: "keystone-backups".to_string(),
            required_apis: vec![
                "run.googleapis.com".to_string(),
                "sqladmin.googleapis.com".to_string(),
                "storage-api.googleapis.com".to_string(),
            ],
            terraform_dir: PathBuf::from("terraform"),
            min_terraform_version: Version::new(1, 5, 0),
            env_file: PathBuf::from(".env"),
            env_template: PathBuf::from(".env.example"),
            command_timeout_secs: 5,
            slow_command_timeout_secs: 10,
        }
    }
}

impl Targets {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn slow_command_timeout(&self) -> Duration {
        Duration::from_secs(self.slow_command_timeout_secs)
    }
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    /// `None` when unset or blank.
    pub project_id: Option<String>,
    pub json_report: bool,
    pub report_dir: PathBuf,
    pub targets: Targets,
}

impl Config {
    pub fn new(environment: &str, project_id: Option<&str>, targets: Targets) -> Self {
        let environment = match environment.trim() {
            "" => "dev".to_string(),
            env => env.to_string(),
        };
        Self {
            environment,
            project_id: project_id
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            json_report: false,
            report_dir: PathBuf::from("."),
            targets,
        }
    }

    pub fn state_bucket(&self) -> String {
        format!("{}-{}", self.targets.state_bucket_prefix, self.environment)
    }
}

/// Load targets from a TOML file.
pub fn load_targets(path: &Path) -> anyhow::Result<Targets> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let targets: Targets =
        toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(targets)
}

/// Returns the default path to `preflight.toml` relative to the current directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("preflight.toml")
}

/// An explicit path must exist; the default path is optional.
pub fn resolve_targets(explicit: Option<&Path>) -> anyhow::Result<Targets> {
    match explicit {
        Some(path) => load_targets(path),
        None => {
            let path = default_config_path();
            if path.is_file() {
                load_targets(&path)
            } else {
                tracing::debug!("no {} found, using built-in targets", path.display());
                Ok(Targets::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_project_id_is_unset() {
        let cfg = Config::new("dev", Some("   "), Targets::default());
        assert_eq!(cfg.project_id, None);
        let cfg = Config::new("dev", Some(" my-proj "), Targets::default());
        assert_eq!(cfg.project_id.as_deref(), Some("my-proj"));
    }

    #[test]
    fn test_empty_environment_defaults_to_dev() {
        let cfg = Config::new("", None, Targets::default());
        assert_eq!(cfg.environment, "dev");
        assert_eq!(cfg.state_bucket(), "keystone-terraform-state-dev");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preflight.toml");
        std::fs::write(
            &path,
            "backup_bucket = \"acme-backups\"\nmin_terraform_version = \"1.7.0\"\n",
        )
        .unwrap();
        let targets = load_targets(&path).unwrap();
        assert_eq!(targets.backup_bucket, "acme-backups");
        assert_eq!(targets.min_terraform_version, Version::new(1, 7, 0));
        assert_eq!(targets.required_apis, Targets::default().required_apis);
        assert_eq!(targets.command_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preflight.toml");
        std::fs::write(&path, "bucket = \"typo\"\n").unwrap();
        let err = load_targets(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_targets(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
