//! Virtual CRM console: a tab strip and a toast area.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

use flowmate_app::ports::ConsoleTabs;
use flowmate_domain::error::{ConsoleError, FlowMateError};
use flowmate_domain::locator::ClickOutcome;

#[derive(Debug, Default)]
struct Console {
    tabs: Vec<String>,
    toasts: usize,
    detached: bool,
    next_record: u32,
}

/// In-memory stand-in for the CRM console.
///
/// Tabs are kept in strip order, oldest first.
#[derive(Debug, Default)]
pub struct VirtualCrmConsole {
    console: Mutex<Console>,
}

impl VirtualCrmConsole {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Console> {
        self.console.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a record tab at the right end of the strip.
    pub fn open_tab(&self, title: impl Into<String>) {
        self.lock().tabs.push(title.into());
    }

    /// Show a toast.
    pub fn push_toast(&self) {
        self.lock().toasts += 1;
    }

    /// Titles of the open tabs, oldest first.
    #[must_use]
    pub fn tabs(&self) -> Vec<String> {
        self.lock().tabs.clone()
    }

    #[must_use]
    pub fn toast_count(&self) -> usize {
        self.lock().toasts
    }

    /// Simulate the console page being unloaded.
    pub fn set_detached(&self, detached: bool) {
        self.lock().detached = detached;
    }

    /// Open a record tab every `tab_every` and raise a toast every
    /// `toast_every`, until the returned handle is aborted. `None` disables
    /// that kind of activity.
    pub fn spawn_activity(
        self: &Arc<Self>,
        tab_every: Option<Duration>,
        toast_every: Option<Duration>,
    ) -> JoinHandle<()> {
        let console = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut tabs = tab_every.map(every);
            let mut toasts = toast_every.map(every);
            loop {
                tokio::select! {
                    () = next_tick(&mut tabs) => {
                        let Some(console) = console.upgrade() else { break };
                        let record = {
                            let mut state = console.lock();
                            state.next_record += 1;
                            state.next_record
                        };
                        console.open_tab(format!("Record {record}"));
                    }
                    () = next_tick(&mut toasts) => {
                        let Some(console) = console.upgrade() else { break };
                        console.push_toast();
                    }
                }
            }
        })
    }

    fn attached(console: &Console) -> Result<(), FlowMateError> {
        if console.detached {
            Err(ConsoleError::Detached { surface: "crm" }.into())
        } else {
            Ok(())
        }
    }
}

fn every(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl ConsoleTabs for VirtualCrmConsole {
    fn count_tabs(&self) -> impl Future<Output = Result<usize, FlowMateError>> + Send {
        let result = {
            let console = self.lock();
            Self::attached(&console).map(|()| console.tabs.len())
        };
        async move { result }
    }

    fn close_tab(
        &self,
        index: usize,
    ) -> impl Future<Output = Result<ClickOutcome, FlowMateError>> + Send {
        let result = {
            let mut console = self.lock();
            Self::attached(&console).map(|()| {
                if index < console.tabs.len() {
                    let title = console.tabs.remove(index);
                    tracing::debug!(%title, index, "virtual tab closed");
                    ClickOutcome::Clicked
                } else {
                    ClickOutcome::NotFound
                }
            })
        };
        async move { result }
    }

    fn dismiss_toasts(&self) -> impl Future<Output = Result<usize, FlowMateError>> + Send {
        let result = {
            let mut console = self.lock();
            Self::attached(&console).map(|()| std::mem::take(&mut console.toasts))
        };
        async move { result }
    }
}
