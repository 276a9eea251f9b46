//! Console hygiene: tab trimming and toast dismissal timings.

use std::time::Duration;

/// Tabs kept open when no limit is configured.
pub const DEFAULT_TAB_LIMIT: u32 = 10;

/// Period of the tab-trimming loop.
pub const TAB_SWEEP_PERIOD: Duration = Duration::from_secs(1);

/// Period of the toast-dismiss loop.
pub const TOAST_SWEEP_PERIOD: Duration = Duration::from_secs(1);

/// Pause between closes when killing every tab.
pub const KILL_TABS_SPACING: Duration = Duration::from_millis(250);

/// A short, aggressive toast-dismiss run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastBurst {
    pub period: Duration,
    pub duration: Duration,
}

/// The one-shot burst: every 500 ms for 5 s.
pub const TOAST_BURST: ToastBurst = ToastBurst {
    period: Duration::from_millis(500),
    duration: Duration::from_secs(5),
};

/// Number of tabs to close so that at most `limit` remain.
#[must_use]
pub fn excess_tabs(open: usize, limit: u32) -> usize {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    open.saturating_sub(limit)
}

/// Tab indices to close for a full sweep, rightmost first.
pub fn kill_order(open: usize) -> impl Iterator<Item = usize> {
    (0..open).rev()
}
