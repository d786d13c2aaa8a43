//! Reference-counted loading indicator.
//!
//! Every call made with `show_loading` holds a [`LoadingGuard`] until it
//! settles. The indicator is visible while at least one guard is alive: the
//! notifier hears `true` on the 0 -> 1 edge and `false` on the 1 -> 0 edge,
//! nothing in between.

use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::notify::Notifier;

pub struct LoadingTracker {
    count: Mutex<usize>,
    notifier: Arc<dyn Notifier>,
}

impl LoadingTracker {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            count: Mutex::new(0),
            notifier,
        }
    }

    /// Increments the count, showing the indicator on the first acquire.
    pub fn acquire(self: &Arc<Self>) -> LoadingGuard {
        let mut count = self.lock();
        *count += 1;
        if *count == 1 {
            debug!("Showing loading indicator");
            // Edge callbacks run under the lock so show/hide can't reorder.
            self.notifier.on_loading_change(true);
        }
        LoadingGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Must not be called from [`Notifier::on_loading_change`].
    pub fn count(&self) -> usize {
        *self.lock()
    }

    pub fn is_visible(&self) -> bool {
        self.count() > 0
    }

    fn release(&self) {
        let mut count = self.lock();
        match *count {
            0 => warn!("Loading indicator released more often than acquired"),
            1 => {
                *count = 0;
                debug!("Hiding loading indicator");
                self.notifier.on_loading_change(false);
            }
            _ => *count -= 1,
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Keeps the indicator visible until dropped.
#[must_use = "the loading indicator is released as soon as the guard is dropped"]
pub struct LoadingGuard {
    tracker: Arc<LoadingTracker>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.tracker.release();
    }
}
