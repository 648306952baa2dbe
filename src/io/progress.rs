//! Progress display for multi-parcellation batches

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::LazyLock;

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    let template =
        format!("[{{elapsed_precise}}] Parcellations: [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}");
    ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Tracks how many parcellations of a batch have been processed
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a progress bar for `count` parcellations
    pub fn new(count: usize) -> Self {
        let bar = ProgressBar::new(count as u64);
        bar.set_style(BATCH_STYLE.clone());
        Self { bar }
    }

    /// Show which parcellation is being processed
    pub fn start(&self, path: &Path) {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        self.bar.set_message(name);
    }

    /// Mark the current parcellation as done
    pub fn complete(&self) {
        self.bar.inc(1);
    }

    /// Clear the progress display
    pub fn finish(&self) {
        self.bar.finish_with_message("all parcellations processed");
    }

    /// Number of parcellations completed so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}
