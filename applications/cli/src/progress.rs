/// Terminal progress bars for reconcile runs
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;
use tracksync_engine::ReconcileProgress;

const TEMPLATE: &str = "{msg:>28} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}";

/// Renders one bar per stage from reconciler events
pub struct ProgressReporter {
    hidden: bool,
    current: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new(hidden: bool) -> Self {
        Self {
            hidden,
            current: Mutex::new(None),
        }
    }

    pub fn handle(&self, event: ReconcileProgress) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };

        match event {
            ReconcileProgress::StageStarted { stage, total } => {
                if let Some(previous) = current.take() {
                    previous.finish_and_clear();
                }
                let bar = self.create_bar(total as u64);
                bar.set_message(stage.to_string());
                *current = Some(bar);
            }
            ReconcileProgress::Advanced { .. } => {
                if let Some(bar) = current.as_ref() {
                    bar.inc(1);
                }
            }
            ReconcileProgress::StageFinished { .. } => {
                if let Some(bar) = current.take() {
                    bar.finish();
                }
            }
        }
    }

    fn create_bar(&self, len: u64) -> ProgressBar {
        let bar = ProgressBar::new(len);
        if self.hidden {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        } else if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar
    }
}
