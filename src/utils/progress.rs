/// Progress reporting for bulk indexing
use crate::storage::{ShardMonitor, ShardProgress};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Create a standard progress bar with consistent styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    if total == 0 && message.is_empty() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━━─"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Create a spinner with consistent styling
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb
}

/// Shard monitor driving a progress bar, with an abort flag that can be
/// raised from another thread
#[derive(Clone)]
pub struct ShardProgressBar {
    bar: ProgressBar,
    abort: Arc<AtomicBool>,
}

impl ShardProgressBar {
    pub fn new(total: usize, message: &str) -> Self {
        Self {
            bar: create_progress_bar(total as u64, message),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag polled between shard operations
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl ShardMonitor for ShardProgressBar {
    fn should_abort(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    fn shard_done(&self, progress: ShardProgress) {
        self.bar.set_length(progress.total as u64);
        self.bar.set_position(progress.completed as u64);
    }
}
