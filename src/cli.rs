use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "deploy-preflight",
    version,
    about = "Deployment readiness gate: checks tooling, auth and cloud resources before deploy"
)]
pub struct Cli {
    /// Deployment environment label (used in bucket names)
    #[arg(long, global = true, env = "APP_ENV", default_value = "dev")]
    pub environment: String,

    /// Cloud project identifier
    #[arg(long, global = true, env = "GCP_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Also write a timestamped JSON report
    #[arg(long, global = true, env = "PREFLIGHT_JSON", value_parser = FalseyValueParser::new())]
    pub json: bool,

    /// Directory the JSON report is written to
    #[arg(long, global = true, default_value = ".")]
    pub report_dir: PathBuf,

    /// Targets file (defaults to ./preflight.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run every check and exit 0 only if deployment may proceed (default)
    Run,

    /// List registered checks without running them
    List,
}
