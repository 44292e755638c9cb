use std::process::ExitCode;

use clap::Parser;
use deploy_preflight::cli::{Cli, Commands};
use deploy_preflight::{check, config, progress, registry, report};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log level comes from `--debug`, then `RUST_LOG`, then defaults to warn.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("deploy_preflight=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    tracing::debug!("starting with args: {:?}", cli);

    let targets = match config::resolve_targets(cli.config.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error loading config: {e:#}");
            return ExitCode::from(2);
        }
    };

    let mut cfg = config::Config::new(&cli.environment, cli.project_id.as_deref(), targets);
    cfg.json_report = cli.json;
    cfg.report_dir = cli.report_dir.clone();

    let checks = registry::default_checks(&cfg);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::List => {
            report::print_check_list(&checks);
            ExitCode::SUCCESS
        }
        Commands::Run => {
            let mut spinner = progress::SpinnerObserver::default();
            let report = check::run_observed(&checks, &cfg.environment, &mut spinner);
            report::print_header(&report.environment, &report.timestamp);
            report::print_report(&report);

            if cfg.json_report {
                match report::write_json(&report, &cfg.report_dir) {
                    Ok(path) => println!("\n📄 Report saved to: {}", path.display()),
                    Err(e) => eprintln!("Error writing JSON report: {e:#}"),
                }
            }

            if report.can_deploy {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
    }
}
