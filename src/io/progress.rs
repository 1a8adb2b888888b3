//! Progress display for batch operations over many variants

use crate::io::configuration::{MIN_PROGRESS_ITEMS, PROGRESS_BAR_WIDTH};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::LazyLock;

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] {{prefix}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Single progress bar counting processed variants
///
/// Stays hidden when disabled or when the batch is too small to be worth a bar
pub struct ProgressManager {
    bar: Option<ProgressBar>,
    completed: usize,
}

impl ProgressManager {
    /// Create a bar for `total` items labelled with `label`
    pub fn new(total: usize, label: &str, enabled: bool) -> Self {
        let bar = (enabled && total >= MIN_PROGRESS_ITEMS).then(|| {
            let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
            bar.set_style(PROGRESS_STYLE.clone());
            bar.set_prefix(label.to_string());
            bar
        });
        Self { bar, completed: 0 }
    }

    /// Whether a bar was created for this batch
    pub const fn is_visible(&self) -> bool {
        self.bar.is_some()
    }

    /// Number of items reported so far
    pub const fn completed(&self) -> usize {
        self.completed
    }

    /// Record one finished item
    pub fn advance(&mut self, name: &str) {
        self.completed += 1;
        if let Some(ref bar) = self.bar {
            bar.set_message(name.to_string());
            bar.inc(1);
        }
    }

    /// Clear the bar from the terminal
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
