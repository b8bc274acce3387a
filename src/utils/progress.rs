//! Terminal progress reporting for long decodes

use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over the segments of a raster
///
/// Hidden unless requested, so library callers and piped CLI runs stay quiet.
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    /// Creates a tracker for `total` steps
    ///
    /// # Arguments
    /// * `total` - Number of steps (strips or tiles)
    /// * `description` - Message shown next to the bar
    /// * `visible` - Whether to draw the bar on stderr
    pub fn new(total: u64, description: &str, visible: bool) -> Self {
        let bar = if visible { ProgressBar::new(total) } else { ProgressBar::hidden() };

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(description.to_string());

        ProgressTracker { bar }
    }

    pub fn increment(&self, amount: u64) {
        self.bar.inc(amount);
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Completed");
    }

    /// Removes the bar, used when decoding stops early
    pub fn abandon(&self) {
        self.bar.abandon();
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}
