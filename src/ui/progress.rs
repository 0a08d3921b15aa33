use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Spinner on stderr while a scan runs. Hidden when not attached to a terminal.
pub struct ProgressIndicator {
    spinner: ProgressBar,
}

impl ProgressIndicator {
    pub fn spinner(message: &str, visible: bool) -> Self {
        let spinner = if visible {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr())
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        if visible {
            spinner.enable_steady_tick(Duration::from_millis(80));
        }
        Self { spinner }
    }

    pub fn set_message(&self, message: &str) {
        self.spinner.set_message(message.to_string());
    }

    pub fn is_hidden(&self) -> bool {
        self.spinner.is_hidden()
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
