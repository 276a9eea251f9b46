//! Console hygiene: keeps the CRM tab strip short and clears toasts.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use flowmate_domain::hygiene::{
    DEFAULT_TAB_LIMIT, KILL_TABS_SPACING, TAB_SWEEP_PERIOD, TOAST_BURST, TOAST_SWEEP_PERIOD,
    excess_tabs, kill_order,
};

use crate::ports::ConsoleTabs;

#[derive(Default)]
struct HygieneTasks {
    tab_loop: Option<JoinHandle<()>>,
    toast_loop: Option<JoinHandle<()>>,
    toast_burst: Option<JoinHandle<()>>,
}

fn is_live(handle: Option<&JoinHandle<()>>) -> bool {
    handle.is_some_and(|handle| !handle.is_finished())
}

struct HygieneInner<T> {
    console: T,
    tab_limit: AtomicU32,
    tasks: Mutex<HygieneTasks>,
}

/// Tab and toast housekeeping for one CRM console.
pub struct ConsoleHygiene<T> {
    inner: Arc<HygieneInner<T>>,
}

impl<T> ConsoleHygiene<T>
where
    T: ConsoleTabs + Send + Sync + 'static,
{
    pub fn new(console: T) -> Self {
        Self {
            inner: Arc::new(HygieneInner {
                console,
                tab_limit: AtomicU32::new(DEFAULT_TAB_LIMIT),
                tasks: Mutex::new(HygieneTasks::default()),
            }),
        }
    }

    #[must_use]
    pub fn tab_limit(&self) -> u32 {
        self.inner.tab_limit.load(Ordering::Relaxed)
    }

    /// Change the limit; the running tab loop picks it up on its next sweep.
    pub fn set_tab_limit(&self, limit: u32) {
        self.inner.tab_limit.store(limit, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_tab_loop_running(&self) -> bool {
        is_live(self.inner.lock_tasks().tab_loop.as_ref())
    }

    #[must_use]
    pub fn is_toast_loop_running(&self) -> bool {
        is_live(self.inner.lock_tasks().toast_loop.as_ref())
    }

    /// Start the periodic tab trim. Idempotent.
    pub fn start_tab_loop(&self) {
        let mut tasks = self.inner.lock_tasks();
        if is_live(tasks.tab_loop.as_ref()) {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        tasks.tab_loop = Some(tokio::spawn(sweep(weak, Chore::TrimTabs, TAB_SWEEP_PERIOD, None)));
        tracing::info!(limit = self.tab_limit(), "tab loop started");
    }

    pub fn stop_tab_loop(&self) {
        if let Some(handle) = self.inner.lock_tasks().tab_loop.take() {
            handle.abort();
            tracing::info!("tab loop stopped");
        }
    }

    /// Start the periodic toast sweep. Idempotent.
    pub fn start_toast_loop(&self) {
        let mut tasks = self.inner.lock_tasks();
        if is_live(tasks.toast_loop.as_ref()) {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        tasks.toast_loop = Some(tokio::spawn(sweep(
            weak,
            Chore::DismissToasts,
            TOAST_SWEEP_PERIOD,
            None,
        )));
        tracing::info!("toast loop started");
    }

    pub fn stop_toast_loop(&self) {
        if let Some(handle) = self.inner.lock_tasks().toast_loop.take() {
            handle.abort();
            tracing::info!("toast loop stopped");
        }
    }

    /// Sweep toasts rapidly for a few seconds.
    ///
    /// Returns `false` when a burst is already running.
    pub fn toast_burst(&self) -> bool {
        let mut tasks = self.inner.lock_tasks();
        if is_live(tasks.toast_burst.as_ref()) {
            tracing::debug!("toast burst already running");
            return false;
        }
        let weak = Arc::downgrade(&self.inner);
        let deadline = Instant::now() + TOAST_BURST.duration;
        tasks.toast_burst = Some(tokio::spawn(sweep(
            weak,
            Chore::DismissToasts,
            TOAST_BURST.period,
            Some(deadline),
        )));
        true
    }

    /// Close every open tab, rightmost first. Returns how many closed.
    #[tracing::instrument(skip(self))]
    pub async fn kill_tabs(&self) -> usize {
        let open = match self.inner.console.count_tabs().await {
            Ok(open) => open,
            Err(err) => {
                tracing::warn!(error = %err, "failed to count tabs");
                return 0;
            }
        };
        let mut closed = 0;
        for (position, index) in kill_order(open).enumerate() {
            if position > 0 {
                tokio::time::sleep(KILL_TABS_SPACING).await;
            }
            match self.inner.console.close_tab(index).await {
                Ok(outcome) if outcome.is_clicked() => closed += 1,
                Ok(outcome) => tracing::debug!(index, ?outcome, "tab not closed"),
                Err(err) => tracing::warn!(index, error = %err, "failed to close tab"),
            }
        }
        closed
    }

    /// Trim tabs once, outside the loop.
    pub async fn trim_tabs(&self) -> usize {
        self.inner.trim_tabs().await
    }

    /// Stop every loop and burst.
    pub fn stop_all(&self) {
        self.inner.lock_tasks().abort_all();
    }
}

impl HygieneTasks {
    fn abort_all(&mut self) {
        for handle in [
            self.tab_loop.take(),
            self.toast_loop.take(),
            self.toast_burst.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

impl<T> Drop for ConsoleHygiene<T> {
    fn drop(&mut self) {
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
    }
}

impl<T> HygieneInner<T>
where
    T: ConsoleTabs + Send + Sync + 'static,
{
    fn lock_tasks(&self) -> MutexGuard<'_, HygieneTasks> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Close the leftmost tabs until at most `tab_limit` remain.
    async fn trim_tabs(&self) -> usize {
        let open = match self.console.count_tabs().await {
            Ok(open) => open,
            Err(err) => {
                tracing::warn!(error = %err, "failed to count tabs");
                return 0;
            }
        };
        let excess = excess_tabs(open, self.tab_limit.load(Ordering::Relaxed));
        let mut closed = 0;
        for _ in 0..excess {
            // indices shift left after each close, so the oldest is always 0
            match self.console.close_tab(0).await {
                Ok(outcome) if outcome.is_clicked() => closed += 1,
                Ok(outcome) => {
                    tracing::debug!(?outcome, "oldest tab not closed");
                    break;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to close tab");
                    break;
                }
            }
        }
        if closed > 0 {
            tracing::debug!(closed, open, "trimmed tabs");
        }
        closed
    }

    async fn dismiss_toasts(&self) {
        match self.console.dismiss_toasts().await {
            Ok(0) => {}
            Ok(dismissed) => tracing::debug!(dismissed, "dismissed toasts"),
            Err(err) => tracing::warn!(error = %err, "failed to dismiss toasts"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Chore {
    TrimTabs,
    DismissToasts,
}

/// Run `chore` every `period` until the owner goes away or `deadline` passes.
async fn sweep<T>(
    weak: Weak<HygieneInner<T>>,
    chore: Chore,
    period: Duration,
    deadline: Option<Instant>,
) where
    T: ConsoleTabs + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        let tick = ticker.tick().await;
        if deadline.is_some_and(|deadline| tick >= deadline) {
            break;
        }
        let Some(inner) = weak.upgrade() else {
            break;
        };
        match chore {
            Chore::TrimTabs => {
                inner.trim_tabs().await;
            }
            Chore::DismissToasts => inner.dismiss_toasts().await,
        }
    }
}
