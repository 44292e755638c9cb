use chrono::Local;

use crate::types::{CheckOutcome, NamedOutcome, Report, Status};

/// Something that can decide pass/fail for one check.
///
/// Implementations must not panic on environmental failures (missing tool,
/// non-zero exit, timeout, bad output); those become a failed outcome.
pub trait Probe {
    fn probe(&self) -> CheckOutcome;
}

impl<F> Probe for F
where
    F: Fn() -> CheckOutcome,
{
    fn probe(&self) -> CheckOutcome {
        self()
    }
}

pub struct Check {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub probe: Box<dyn Probe>,
}

impl Check {
    pub fn required(name: &'static str, description: &'static str, probe: impl Probe + 'static) -> Self {
        Self {
            name,
            description,
            required: true,
            probe: Box::new(probe),
        }
    }

    pub fn optional(name: &'static str, description: &'static str, probe: impl Probe + 'static) -> Self {
        Self {
            name,
            description,
            required: false,
            probe: Box::new(probe),
        }
    }
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// Hooks invoked around each probe, e.g. for progress display.
pub trait RunObserver {
    fn check_started(&mut self, _check: &Check) {}
    fn check_finished(&mut self, _outcome: &NamedOutcome) {}
}

impl RunObserver for () {}

/// Run every check once, in order, and aggregate the results.
pub fn run(checks: &[Check], environment: &str) -> Report {
    run_observed(checks, environment, &mut ())
}

pub fn run_observed(checks: &[Check], environment: &str, observer: &mut dyn RunObserver) -> Report {
    let mut report = Report {
        timestamp: Local::now(),
        environment: environment.to_string(),
        total_checks: checks.len(),
        passed: 0,
        failed: 0,
        warnings: 0,
        checks: Vec::with_capacity(checks.len()),
        can_deploy: false,
    };

    for check in checks {
        observer.check_started(check);
        tracing::info!("running check {}", check.name);

        let outcome = NamedOutcome {
            name: check.name.to_string(),
            required: check.required,
            result: check.probe.probe(),
        };

        match outcome.status() {
            Status::Passed => report.passed += 1,
            Status::Failed => report.failed += 1,
            Status::Warning => report.warnings += 1,
        }
        tracing::info!("check {} finished: {:?}", check.name, outcome.status());

        observer.check_finished(&outcome);
        report.checks.push(outcome);
    }

    report.can_deploy = report.failed == 0;
    report
}
