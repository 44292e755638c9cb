use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::Style;

use crate::check::Check;
use crate::types::{Report, Status};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

pub fn print_header(environment: &str, timestamp: &chrono::DateTime<chrono::Local>) {
    println!("🚀 Deploy Preflight Check");
    println!("Environment: {environment}");
    println!("Timestamp: {}\n", timestamp.to_rfc3339());
}

pub fn print_report(report: &Report) {
    print!("{}", render_report(report));
}

/// Render the result block, summary and verdict.
pub fn render_report(report: &Report) -> String {
    let green = Style::new().green();
    let red = Style::new().red();
    let yellow = Style::new().yellow();

    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Preflight Check Results");
    let _ = writeln!(out, "{RULE}");

    for check in &report.checks {
        let symbol = match check.status() {
            Status::Passed => green.apply_to("✓"),
            Status::Failed => red.apply_to("✗"),
            Status::Warning => yellow.apply_to("⚠"),
        };
        let _ = writeln!(out, "{symbol} {}", check.result.message);
        if let Some(details) = check.result.details.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "  → {details}");
        }
    }

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(
        out,
        "Total: {} | Passed: {} | Failed: {} | Warnings: {}",
        report.total_checks, report.passed, report.failed, report.warnings
    );
    let _ = writeln!(out, "{RULE}");

    if report.can_deploy {
        let _ = writeln!(out, "{}", green.apply_to("✓ Ready to deploy"));
    } else {
        let _ = writeln!(out, "{}", red.apply_to("✗ Not ready to deploy - fix required checks"));
    }
    out
}

/// List registered checks without running them.
pub fn print_check_list(checks: &[Check]) {
    let dim = Style::new().dim();
    for (i, check) in checks.iter().enumerate() {
        let tag = if check.required { "required" } else { "optional" };
        println!(
            "{:>2}. {:<22} {} {}",
            i + 1,
            check.name,
            check.description,
            dim.apply_to(format!("[{tag}]"))
        );
    }
}

/// File name for the JSON artifact of a run.
pub fn json_report_path(dir: &Path, report: &Report) -> PathBuf {
    dir.join(format!(
        "preflight-report-{}.json",
        report.timestamp.format("%Y%m%d-%H%M%S")
    ))
}

/// Write the report as pretty-printed JSON and return where it went.
pub fn write_json(report: &Report, dir: &Path) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")?;
    let path = json_report_path(dir, report);
    fs::write(&path, json).with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;
    use crate::types::{CheckOutcome, NamedOutcome};

    fn sample() -> Report {
        Report {
            timestamp: Local::now(),
            environment: "dev".to_string(),
            total_checks: 3,
            passed: 1,
            failed: 1,
            warnings: 1,
            checks: vec![
                NamedOutcome {
                    name: "gcloud-installed".to_string(),
                    required: true,
                    result: CheckOutcome::pass("gcloud CLI is installed"),
                },
                NamedOutcome {
                    name: "terraform-installed".to_string(),
                    required: true,
                    result: CheckOutcome::fail("Terraform not found")
                        .with_details("Install from: https://www.terraform.io/downloads"),
                },
                NamedOutcome {
                    name: "env-file-exists".to_string(),
                    required: false,
                    result: CheckOutcome::fail(".env file not found"),
                },
            ],
            can_deploy: false,
        }
    }

    #[test]
    fn test_render_lists_checks_in_order_with_summary() {
        let text = render_report(&sample());
        let installed = text.find("gcloud CLI is installed").unwrap();
        let missing = text.find("Terraform not found").unwrap();
        let env = text.find(".env file not found").unwrap();
        assert!(installed < missing && missing < env);
        assert!(text.contains("  → Install from: https://www.terraform.io/downloads"));
        assert!(text.contains("Total: 3 | Passed: 1 | Failed: 1 | Warnings: 1"));
        assert!(text.contains("Not ready to deploy - fix required checks"));
        assert!(text.contains('⚠'));
    }

    #[test]
    fn test_write_json_schema() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample();
        let path = write_json(&report, dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("preflight-report-") && name.ends_with(".json"));
        assert_eq!(name.len(), "preflight-report-20250101-120000.json".len());

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["Environment"], "dev");
        assert_eq!(value["TotalChecks"], 3);
        assert_eq!(value["Failed"], 1);
        assert_eq!(value["CanDeploy"], false);
        assert_eq!(value["Checks"][1]["Name"], "terraform-installed");
        assert_eq!(value["Checks"][1]["Required"], true);
        assert_eq!(value["Checks"][1]["Result"]["Passed"], false);
        assert_eq!(value["Checks"][0]["Result"]["Details"], "");
        assert!(value["Timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_write_json_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_json(&sample(), &dir.path().join("nope")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to write report"));
    }
}
