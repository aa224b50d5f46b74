//! Progress bar for registry lookups.

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use upd_deps::{ProgressEvent, ProgressSink};

/// Width of the package name column in the progress message
const LABEL_WIDTH: usize = 24;

/// Renders [`ProgressEvent`]s as an indicatif bar on stderr
///
/// The bar is created on the first event, once the number of lookups is
/// known, and cleared when the run finishes.
pub struct ProgressReporter {
    pb: Option<ProgressBar>,
    enabled: bool,
    colors: bool,
}

impl ProgressReporter {
    /// Create a reporter; a disabled one ignores every event
    pub fn new(enabled: bool, colors: bool) -> Self {
        Self {
            pb: None,
            enabled,
            colors,
        }
    }

    fn bar(&mut self, total: usize) -> &ProgressBar {
        let colors = self.colors;
        self.pb.get_or_insert_with(|| {
            let pb = ProgressBar::new(total as u64);
            let template = if colors {
                "checking: {bar:24.blue} {percent:>3}% {elapsed:>3} {msg:.blue}"
            } else {
                "checking: {bar:24} {percent:>3}% {elapsed:>3} {msg}"
            };
            let style = ProgressStyle::default_bar()
                .template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            pb.set_style(style.progress_chars("█╌"));
            pb
        })
    }
}

impl ProgressSink for ProgressReporter {
    fn on_progress(&mut self, event: &ProgressEvent) {
        if !self.enabled {
            return;
        }
        let message = format!(
            "{}: {}",
            HumanBytes(event.cumulative_bytes as u64),
            label(&event.current_name)
        );
        let pb = self.bar(event.total);
        pb.set_position(event.completed as u64);
        pb.set_message(message);
    }

    fn finish(&mut self) {
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
    }
}

/// Fixed-width package name: long names are cut with `...`, every label
/// is padded to [`LABEL_WIDTH`]
fn label(name: &str) -> String {
    let shown = if name.chars().count() > LABEL_WIDTH {
        let head: String = name.chars().take(LABEL_WIDTH - 5).collect();
        format!("{head}...")
    } else {
        name.to_string()
    };
    format!("{shown:<width$}", width = LABEL_WIDTH)
}
