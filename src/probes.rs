//! Concrete probes for the deployment gate.
//!
//! Each probe owns the inputs it needs (copied out of [`Config`] when the
//! registry is built) and turns every failure mode into a failed
//! [`CheckOutcome`], usually with the command that fixes it as details.
//!
//! [`Config`]: crate::config::Config

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use semver::Version;
use serde::Deserialize;

use crate::check::Probe;
use crate::exec::{ExecError, ExecResult, run_cmd_timeout};
use crate::types::CheckOutcome;

pub const GCLOUD: &str = "gcloud";
pub const TERRAFORM: &str = "terraform";
pub const GSUTIL: &str = "gsutil";

/// A CLI tool is on PATH.
pub struct ToolInstalled {
    pub tool: &'static str,
    pub display: &'static str,
    pub install_url: &'static str,
}

impl Probe for ToolInstalled {
    fn probe(&self) -> CheckOutcome {
        match which::which(self.tool) {
            Ok(path) => {
                tracing::debug!("{} found at {}", self.tool, path.display());
                CheckOutcome::pass(format!("{} is installed", self.display))
            }
            Err(_) => CheckOutcome::fail(format!("{} not found", self.display))
                .with_details(format!("Install from: {}", self.install_url)),
        }
    }
}

/// gcloud has an active account.
pub struct GcloudAuthenticated {
    pub timeout: Duration,
}

impl Probe for GcloudAuthenticated {
    fn probe(&self) -> CheckOutcome {
        let not_authenticated =
            || CheckOutcome::fail("gcloud not authenticated").with_details("Run: gcloud auth login");

        match run_cmd_timeout(
            GCLOUD,
            &["auth", "list", "--filter=status:ACTIVE", "--format=value(account)"],
            self.timeout,
        ) {
            Ok(exec) if exec.success() => match active_account(&exec.stdout) {
                Some(account) => CheckOutcome::pass("gcloud is authenticated")
                    .with_details(format!("Active account: {account}")),
                None => not_authenticated(),
            },
            Ok(_) => not_authenticated(),
            Err(err) if err.is_not_found() => CheckOutcome::fail("Could not check gcloud authentication")
                .with_details("gcloud not found; install from: https://cloud.google.com/sdk/docs/install"),
            Err(err) => {
                tracing::warn!("auth query failed: {err}");
                CheckOutcome::fail("Could not check gcloud authentication").with_details(err.to_string())
            }
        }
    }
}

/// First non-empty line of the account listing.
fn active_account(stdout: &str) -> Option<&str> {
    stdout.lines().map(str::trim).find(|l| !l.is_empty())
}

/// terraform reports a version at or above `minimum`.
pub struct TerraformVersion {
    pub minimum: Version,
    pub timeout: Duration,
}

#[derive(Deserialize)]
struct TerraformVersionJson {
    terraform_version: String,
}

impl Probe for TerraformVersion {
    fn probe(&self) -> CheckOutcome {
        let exec = match run_cmd_timeout(TERRAFORM, &["version", "-json"], self.timeout) {
            Ok(exec) if exec.success() => exec,
            Ok(exec) => {
                return CheckOutcome::fail("Could not check Terraform version")
                    .with_details(failure_text(&exec));
            }
            Err(err) => {
                return CheckOutcome::fail("Could not check Terraform version").with_details(err.to_string());
            }
        };

        let Some(found) = parse_terraform_version(&exec.stdout) else {
            return CheckOutcome::fail("Could not parse Terraform version");
        };

        if found >= self.minimum {
            CheckOutcome::pass("Terraform version is compatible").with_details(format!("Version: {found}"))
        } else {
            CheckOutcome::fail("Terraform version too old")
                .with_details(format!("Found: {found}, Required: >= {}", self.minimum))
        }
    }
}

/// Parse `terraform version -json` output into a semver version.
fn parse_terraform_version(stdout: &str) -> Option<Version> {
    let info: TerraformVersionJson = serde_json::from_str(stdout).ok()?;
    let raw = info.terraform_version.trim();
    Version::parse(raw.strip_prefix('v').unwrap_or(raw)).ok()
}

/// The project identifier is configured.
pub struct ProjectIdSet {
    pub project_id: Option<String>,
}

impl Probe for ProjectIdSet {
    fn probe(&self) -> CheckOutcome {
        match &self.project_id {
            Some(id) => CheckOutcome::pass("GCP_PROJECT_ID is set").with_details(format!("Project: {id}")),
            None => CheckOutcome::fail("GCP_PROJECT_ID not set").with_details("Set in .env or environment"),
        }
    }
}

/// Every required API is enabled on the project.
pub struct RequiredApis {
    pub project_id: Option<String>,
    pub apis: Vec<String>,
    pub timeout: Duration,
}

impl Probe for RequiredApis {
    fn probe(&self) -> CheckOutcome {
        let Some(project) = &self.project_id else {
            return CheckOutcome::fail("Cannot check APIs - project ID not set");
        };

        let project_arg = format!("--project={project}");
        let exec = match run_cmd_timeout(
            GCLOUD,
            &["services", "list", "--enabled", project_arg.as_str(), "--format=value(name)"],
            self.timeout,
        ) {
            Ok(exec) if exec.success() => exec,
            Ok(exec) => {
                let stderr = exec.stderr.trim();
                let details = if stderr.is_empty() {
                    "Ensure you have permission to list services".to_string()
                } else {
                    stderr.to_string()
                };
                return CheckOutcome::fail("Could not check enabled APIs").with_details(details);
            }
            Err(err) => return CheckOutcome::fail("Could not check enabled APIs").with_details(err.to_string()),
        };

        let enabled = parse_enabled_apis(&exec.stdout);
        let missing = missing_apis(&self.apis, &enabled);
        if missing.is_empty() {
            return CheckOutcome::pass("Required APIs are enabled");
        }

        let message = if enabled.is_empty() {
            format!("No APIs are enabled in project {project}")
        } else {
            "Required APIs not enabled".to_string()
        };
        CheckOutcome::fail(message).with_details(format!("Missing: {}", missing.join(", ")))
    }
}

fn parse_enabled_apis(stdout: &str) -> HashSet<&str> {
    stdout.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

fn missing_apis<'a>(required: &'a [String], enabled: &HashSet<&str>) -> Vec<&'a str> {
    required
        .iter()
        .map(String::as_str)
        .filter(|api| !enabled.contains(api))
        .collect()
}

/// A storage bucket exists.
pub struct BucketExists {
    pub label: &'static str,
    pub bucket: String,
    /// Set when the check depends on the project identifier.
    pub requires_project: bool,
    pub project_id: Option<String>,
    pub timeout: Duration,
}

impl Probe for BucketExists {
    fn probe(&self) -> CheckOutcome {
        if self.requires_project && self.project_id.is_none() {
            return CheckOutcome::fail(format!(
                "Cannot check {} - project ID not set",
                self.label.to_lowercase()
            ));
        }

        let url = format!("gs://{}", self.bucket);
        match run_cmd_timeout(GSUTIL, &["ls", "-b", url.as_str()], self.timeout) {
            Ok(exec) if exec.success() => {
                CheckOutcome::pass(format!("{} exists", self.label)).with_details(format!("Bucket: {url}"))
            }
            Ok(_) => CheckOutcome::fail(format!("{} does not exist", self.label))
                .with_details(format!("Create with: gsutil mb {url}")),
            Err(err @ ExecError::TimedOut { .. }) => {
                CheckOutcome::fail(format!("Could not check {}", self.label.to_lowercase()))
                    .with_details(err.to_string())
            }
            Err(err) if err.is_not_found() => {
                CheckOutcome::fail(format!("Could not check {}", self.label.to_lowercase()))
                    .with_details("gsutil not found; install the Google Cloud SDK")
            }
            Err(err) => CheckOutcome::fail(format!("Could not check {}", self.label.to_lowercase()))
                .with_details(err.to_string()),
        }
    }
}

/// The local env file is present.
pub struct EnvFileExists {
    pub path: PathBuf,
    pub template: PathBuf,
}

impl Probe for EnvFileExists {
    fn probe(&self) -> CheckOutcome {
        let name = self.path.display();
        if self.path.exists() {
            CheckOutcome::pass(format!("{name} file exists"))
        } else {
            CheckOutcome::fail(format!("{name} file not found"))
                .with_details(format!("Copy from {} and configure", self.template.display()))
        }
    }
}

/// `terraform fmt -check` reports no changes.
pub struct TerraformFormatted {
    pub dir: PathBuf,
    pub timeout: Duration,
}

impl Probe for TerraformFormatted {
    fn probe(&self) -> CheckOutcome {
        let dir = self.dir.to_string_lossy();
        match run_cmd_timeout(TERRAFORM, &["fmt", "-check", "-recursive", dir.as_ref()], self.timeout) {
            Ok(exec) if exec.success() => CheckOutcome::pass("Terraform files are formatted"),
            Ok(_) => CheckOutcome::fail("Terraform files not formatted")
                .with_details(format!("Run: terraform fmt -recursive {dir}")),
            Err(err) if err.is_not_found() => CheckOutcome::fail("Could not check Terraform formatting")
                .with_details("terraform not found; install from: https://www.terraform.io/downloads"),
            Err(err) => CheckOutcome::fail("Could not check Terraform formatting").with_details(err.to_string()),
        }
    }
}

fn failure_text(exec: &ExecResult) -> String {
    match exec.stderr.trim() {
        "" => format!("exit code {}", exec.exit_code),
        stderr => stderr.to_string(),
    }
}
