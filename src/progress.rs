use indicatif::{ProgressBar, ProgressStyle};

use crate::check::{Check, RunObserver};
use crate::types::NamedOutcome;

pub fn stage_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Shows a transient spinner on stderr while each probe runs.
#[derive(Default)]
pub struct SpinnerObserver {
    current: Option<ProgressBar>,
}

impl RunObserver for SpinnerObserver {
    fn check_started(&mut self, check: &Check) {
        self.current = Some(stage_spinner(&format!("Checking {}...", check.description)));
    }

    fn check_finished(&mut self, _outcome: &NamedOutcome) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
    }
}
