use crate::check::Check;
use crate::config::Config;
use crate::probes::{
    BucketExists, EnvFileExists, GCLOUD, GcloudAuthenticated, ProjectIdSet, RequiredApis, TERRAFORM,
    TerraformFormatted, TerraformVersion, ToolInstalled,
};

/// The deployment gate, in display order. Performs no I/O.
pub fn default_checks(cfg: &Config) -> Vec<Check> {
    let targets = &cfg.targets;
    let timeout = targets.command_timeout();
    let slow_timeout = targets.slow_command_timeout();

    vec![
        Check::required(
            "gcloud-installed",
            "gcloud CLI is installed",
            ToolInstalled {
                tool: GCLOUD,
                display: "gcloud CLI",
                install_url: "https://cloud.google.com/sdk/docs/install",
            },
        ),
        Check::required(
            "gcloud-authenticated",
            "gcloud is authenticated",
            GcloudAuthenticated { timeout },
        ),
        Check::required(
            "terraform-installed",
            "Terraform is installed",
            ToolInstalled {
                tool: TERRAFORM,
                display: "Terraform",
                install_url: "https://www.terraform.io/downloads",
            },
        ),
        Check::required(
            "terraform-version",
            "Terraform version meets the minimum",
            TerraformVersion {
                minimum: targets.min_terraform_version.clone(),
                timeout,
            },
        ),
        Check::required(
            "project-id-set",
            "GCP_PROJECT_ID is set",
            ProjectIdSet {
                project_id: cfg.project_id.clone(),
            },
        ),
        Check::required(
            "required-apis",
            "Required GCP APIs are enabled",
            RequiredApis {
                project_id: cfg.project_id.clone(),
                apis: targets.required_apis.clone(),
                timeout: slow_timeout,
            },
        ),
        Check::required(
            "state-bucket-exists",
            "Terraform state bucket exists",
            BucketExists {
                label: "Terraform state bucket",
                bucket: cfg.state_bucket(),
                requires_project: true,
                project_id: cfg.project_id.clone(),
                timeout,
            },
        ),
        Check::optional(
            "backup-bucket-exists",
            "Backup bucket exists",
            BucketExists {
                label: "Backup bucket",
                bucket: targets.backup_bucket.clone(),
                requires_project: false,
                project_id: cfg.project_id.clone(),
                timeout,
            },
        ),
        Check::optional(
            "env-file-exists",
            ".env file is configured",
            EnvFileExists {
                path: targets.env_file.clone(),
                template: targets.env_template.clone(),
            },
        ),
        Check::optional(
            "terraform-formatted",
            "Terraform files are formatted",
            TerraformFormatted {
                dir: targets.terraform_dir.clone(),
                timeout: slow_timeout,
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::check::run;
    use crate::config::Targets;

    #[test]
    fn test_registry_order_and_policy() {
        let cfg = Config::new("dev", Some("acme"), Targets::default());
        let checks = default_checks(&cfg);
        let summary: Vec<(&str, bool)> = checks.iter().map(|c| (c.name, c.required)).collect();
        assert_eq!(
            summary,
            vec![
                ("gcloud-installed", true),
                ("gcloud-authenticated", true),
                ("terraform-installed", true),
                ("terraform-version", true),
                ("project-id-set", true),
                ("required-apis", true),
                ("state-bucket-exists", true),
                ("backup-bucket-exists", false),
                ("env-file-exists", false),
                ("terraform-formatted", false),
            ]
        );
        let unique: HashSet<&str> = checks.iter().map(|c| c.name).collect();
        assert_eq!(unique.len(), checks.len());
    }

    #[test]
    fn test_prerequisite_probes_fail_without_project() {
        let cfg = Config::new("dev", None, Targets::default());
        let checks: Vec<Check> = default_checks(&cfg)
            .into_iter()
            .filter(|c| matches!(c.name, "project-id-set" | "required-apis" | "state-bucket-exists"))
            .collect();
        let report = run(&checks, &cfg.environment);
        assert_eq!(report.failed, 3);
        assert!(!report.can_deploy);
        for outcome in &report.checks {
            assert!(!outcome.result.passed);
            assert!(
                outcome.result.message.contains("project ID not set")
                    || outcome.result.message.contains("GCP_PROJECT_ID not set"),
                "unexpected message: {}",
                outcome.result.message
            );
        }
    }
}
