//! User-facing side effects of the client: transient notices and the loading
//! indicator.
//!
//! The client never talks to a terminal or a UI toolkit directly. It reports
//! through a [`Notifier`] injected at construction, so the interceptor logic
//! stays independent of how (or whether) things are shown.

use log::debug;
use std::io::Write;

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(msg) | Notice::Error(msg) => msg,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Called with `true` when the first loading-tracked call starts and with
    /// `false` when the last one settles. Never called twice in a row with
    /// the same value.
    ///
    /// Runs while the loading counter is locked: calling
    /// `LoadingTracker::count` or `is_visible` from here deadlocks. Use
    /// `visible` instead.
    fn on_loading_change(&self, visible: bool);

    fn on_notify(&self, notice: &Notice);
}

/// Writes notices and the loading state to stderr.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    errors: bool,
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self { errors: true }
    }
}

impl ConsoleNotifier {
    /// Leaves error notices to the caller, e.g. a CLI that reports the
    /// returned error on exit.
    pub fn without_errors(mut self) -> Self {
        self.errors = false;
        self
    }

    fn render(&self, notice: &Notice) -> Option<String> {
        match notice {
            Notice::Success(msg) => Some(msg.clone()),
            Notice::Error(msg) if self.errors => Some(format!("error: {}", msg)),
            Notice::Error(msg) => {
                debug!("Error notice left to the caller: {}", msg);
                None
            }
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn on_loading_change(&self, visible: bool) {
        if visible {
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "Loading...");
        } else {
            debug!("Loading indicator hidden");
        }
    }

    fn on_notify(&self, notice: &Notice) {
        if let Some(line) = self.render(notice) {
            let _ = writeln!(std::io::stderr(), "{}", line);
        }
    }
}

/// Discards everything. Diagnostics still go to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn on_loading_change(&self, _visible: bool) {}

    fn on_notify(&self, _notice: &Notice) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_message() {
        assert_eq!(Notice::Success("saved".into()).message(), "saved");
        assert_eq!(Notice::Error("boom".into()).message(), "boom");
    }

    #[test]
    fn test_builtin_notifiers_do_not_panic() {
        let console = ConsoleNotifier::default();
        for notifier in [&console as &dyn Notifier, &SilentNotifier] {
            notifier.on_loading_change(true);
            notifier.on_notify(&Notice::Success("ok".into()));
            notifier.on_notify(&Notice::Error("failed".into()));
            notifier.on_loading_change(false);
        }
    }

    #[test]
    fn test_console_rendering() {
        let console = ConsoleNotifier::default();
        assert_eq!(console.render(&Notice::Success("saved".into())).as_deref(), Some("saved"));
        assert_eq!(console.render(&Notice::Error("boom".into())).as_deref(), Some("error: boom"));

        let console = console.without_errors();
        assert_eq!(console.render(&Notice::Success("saved".into())).as_deref(), Some("saved"));
        assert_eq!(console.render(&Notice::Error("boom".into())), None);
    }
}
