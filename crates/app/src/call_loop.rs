//! Call loop runtime: drives a [`CallAutomaton`] with tokio timers.
//!
//! Two tasks exist per running loop: the poll task (every `poll_interval`,
//! reads the call-status header) and the countdown task (every second while
//! counting down, first tick one second after the countdown starts). Both
//! hold only a weak reference to the loop, and both are aborted on stop and
//! when the [`CallLoop`] is dropped.
//!
//! Transitions and their timer effects are applied under one synchronous
//! lock, which is never held across an await. Events are published after
//! the lock is released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use flowmate_domain::automaton::{CallAutomaton, Effect, LoopState};
use flowmate_domain::call::CallSnapshot;
use flowmate_domain::config::AutomationConfig;
use flowmate_domain::event::{Event, EventKind};
use flowmate_domain::next_call::NextCallOutcome;

use crate::next_call::NextCallAction;
use crate::ports::{CallStatusReader, ClickSimulator, CuePlayer, EventPublisher};

/// Default period of the poll task.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

#[derive(Default)]
struct LoopCore {
    automaton: CallAutomaton,
    poll_task: Option<JoinHandle<()>>,
    countdown_task: Option<JoinHandle<()>>,
    sequence_task: Option<JoinHandle<()>>,
}

impl LoopCore {
    fn abort_all(&mut self) {
        for handle in [
            self.poll_task.take(),
            self.countdown_task.take(),
            self.sequence_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

struct LoopInner<R, Q, C, P> {
    reader: R,
    cues: Q,
    action: Arc<NextCallAction<C, P>>,
    config: watch::Sender<AutomationConfig>,
    poll_interval: Duration,
    core: Mutex<LoopCore>,
}

/// The automation loop for one softphone surface.
pub struct CallLoop<R, Q, C, P> {
    inner: Arc<LoopInner<R, Q, C, P>>,
}

impl<R, Q, C, P> CallLoop<R, Q, C, P>
where
    R: CallStatusReader + Send + Sync + 'static,
    Q: CuePlayer + Send + Sync + 'static,
    C: ClickSimulator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create an idle loop.
    pub fn new(
        reader: R,
        cues: Q,
        action: Arc<NextCallAction<C, P>>,
        config: AutomationConfig,
        poll_interval: Duration,
    ) -> Self {
        let (config, _) = watch::channel(config);
        Self {
            inner: Arc::new(LoopInner {
                reader,
                cues,
                action,
                config,
                poll_interval,
                core: Mutex::new(LoopCore::default()),
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        self.inner.lock_core().automaton.state()
    }

    #[must_use]
    pub fn config(&self) -> AutomationConfig {
        *self.inner.config.borrow()
    }

    /// Observe configuration pushes.
    #[must_use]
    pub fn watch_config(&self) -> watch::Receiver<AutomationConfig> {
        self.inner.config.subscribe()
    }

    /// Whether a next-call run is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.inner.action.flags().is_busy()
    }

    #[must_use]
    pub fn is_ready_for_next(&self) -> bool {
        self.inner.action.flags().is_ready_for_next()
    }

    /// Replace the configuration. A running countdown keeps its length.
    pub fn configure(&self, config: AutomationConfig) {
        self.inner.config.send_replace(config);
    }

    /// `Idle → Polling`. Idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) {
        let events = self.inner.transition(|automaton, _| automaton.start());
        self.inner.publish(events).await;
    }

    /// Any state `→ Idle`, resetting `ready_for_next`. A next-call
    /// sequence already running is left to finish.
    #[tracing::instrument(skip(self))]
    pub async fn stop(&self) {
        let events = self.inner.transition(|automaton, _| automaton.stop());
        self.inner.action.flags().reset_ready();
        self.inner.publish(events).await;
    }

    /// Abort a pending countdown, staying in `Polling`.
    pub async fn cancel_countdown(&self) {
        let events = self
            .inner
            .transition(|automaton, _| automaton.cancel_countdown());
        self.inner.publish(events).await;
    }

    /// Manual trigger: cancel any pending countdown, then run the sequence
    /// now under the shared busy guard.
    #[tracing::instrument(skip(self))]
    pub async fn trigger_now(&self) -> NextCallOutcome {
        let (events, permit) = {
            let mut core = self.inner.lock_core();
            let effects = core.automaton.cancel_countdown();
            let config = *self.inner.config.borrow();
            let events = self.inner.perform(&mut core, effects, &config);
            (events, self.inner.action.try_begin())
        };
        self.inner.publish(events).await;

        match permit {
            Some(permit) => self.inner.action.run(permit).await,
            None => {
                tracing::debug!("manual trigger ignored, sequence already running");
                NextCallOutcome::Skipped
            }
        }
    }
}

impl<R, Q, C, P> Drop for CallLoop<R, Q, C, P> {
    fn drop(&mut self) {
        self.inner
            .core
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
    }
}

impl<R, Q, C, P> LoopInner<R, Q, C, P>
where
    R: CallStatusReader + Send + Sync + 'static,
    Q: CuePlayer + Send + Sync + 'static,
    C: ClickSimulator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    fn lock_core(&self) -> MutexGuard<'_, LoopCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one automaton input and its effects atomically.
    fn transition<F>(self: &Arc<Self>, input: F) -> Vec<EventKind>
    where
        F: FnOnce(&mut CallAutomaton, &AutomationConfig) -> Vec<Effect>,
    {
        let config = *self.config.borrow();
        let mut core = self.lock_core();
        let effects = input(&mut core.automaton, &config);
        self.perform(&mut core, effects, &config)
    }

    fn perform(
        self: &Arc<Self>,
        core: &mut LoopCore,
        effects: Vec<Effect>,
        config: &AutomationConfig,
    ) -> Vec<EventKind> {
        let firing = effects.contains(&Effect::TriggerNextCall);
        let mut events = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartPolling => {
                    if core.poll_task.as_ref().is_none_or(JoinHandle::is_finished) {
                        let weak = Arc::downgrade(self);
                        core.poll_task = Some(tokio::spawn(poll_task(weak, self.poll_interval)));
                    }
                    events.push(EventKind::LoopStarted);
                }
                Effect::StopPolling => {
                    if let Some(handle) = core.poll_task.take() {
                        handle.abort();
                    }
                    events.push(EventKind::LoopStopped);
                }
                Effect::StartCountdown { seconds } => {
                    if let Some(handle) = core.countdown_task.take() {
                        handle.abort();
                    }
                    let weak = Arc::downgrade(self);
                    core.countdown_task = Some(tokio::spawn(countdown_task(weak)));
                    tracing::info!(seconds, "countdown started");
                    events.push(EventKind::CountdownStarted { seconds });
                }
                Effect::CountdownTick { remaining } => {
                    events.push(EventKind::CountdownTick { remaining });
                }
                Effect::StopCountdown => {
                    let handle = core.countdown_task.take();
                    if firing {
                        // final tick: the countdown task is the caller and ends itself
                        drop(handle);
                    } else {
                        if let Some(handle) = handle {
                            handle.abort();
                        }
                        events.push(EventKind::CountdownCancelled);
                    }
                }
                Effect::PlayCue(cue) => self.cues.play(cue.tone(), config.volume),
                Effect::TriggerNextCall => match self.action.try_begin() {
                    Some(permit) => {
                        let action = Arc::clone(&self.action);
                        core.sequence_task = Some(tokio::spawn(async move {
                            action.run(permit).await;
                        }));
                    }
                    None => tracing::warn!("countdown elapsed while a sequence was running"),
                },
            }
        }
        events
    }

    async fn poll_once(self: &Arc<Self>) {
        let snapshot = match self.reader.read_call_status().await {
            Ok(raw) if !raw.is_empty() => Some(CallSnapshot::from(&raw)),
            Ok(_) => None,
            Err(err) => {
                tracing::trace!(error = %err, "call status unavailable");
                None
            }
        };
        let events = self.transition(|automaton, config| {
            let ready = self.action.flags().is_ready_for_next();
            automaton.poll(snapshot.as_ref(), ready, config)
        });
        self.publish(events).await;
    }

    /// Returns `false` once the countdown is over.
    async fn countdown_once(self: &Arc<Self>) -> bool {
        let events = self.transition(|automaton, _| automaton.countdown_tick());
        let counting = self.lock_core().automaton.state().countdown_remaining().is_some();
        self.publish(events).await;
        counting
    }

    async fn publish(&self, events: Vec<EventKind>) {
        for kind in events {
            if let Err(err) = self.action.publisher().publish(Event::new(kind)).await {
                tracing::warn!(error = %err, "failed to publish loop event");
            }
        }
    }
}

async fn poll_task<R, Q, C, P>(weak: Weak<LoopInner<R, Q, C, P>>, period: Duration)
where
    R: CallStatusReader + Send + Sync + 'static,
    Q: CuePlayer + Send + Sync + 'static,
    C: ClickSimulator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(inner) = weak.upgrade() else {
            break;
        };
        inner.poll_once().await;
    }
}

async fn countdown_task<R, Q, C, P>(weak: Weak<LoopInner<R, Q, C, P>>)
where
    R: CallStatusReader + Send + Sync + 'static,
    Q: CuePlayer + Send + Sync + 'static,
    C: ClickSimulator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + COUNTDOWN_PERIOD, COUNTDOWN_PERIOD);
    loop {
        ticker.tick().await;
        let Some(inner) = weak.upgrade() else {
            break;
        };
        if !inner.countdown_once().await {
            break;
        }
    }
}
