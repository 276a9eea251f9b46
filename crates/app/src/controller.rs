//! Controller: routes commands to the widgets attached on a surface and
//! owns the operator settings.

use std::sync::{Mutex, MutexGuard, PoisonError};

use flowmate_domain::automaton::LoopState;
use flowmate_domain::command::{
    AutomationReport, Command, CommandReply, HygieneReport, StateReport,
};
use flowmate_domain::error::FlowMateError;
use flowmate_domain::event::{Event, EventKind};
use flowmate_domain::settings::{Settings, SettingsPatch};
use flowmate_domain::surface::Surface;
use flowmate_domain::trigger::TriggerPolicy;

use crate::call_loop::CallLoop;
use crate::hygiene::ConsoleHygiene;
use crate::ports::{
    CallStatusReader, ClickSimulator, ConsoleTabs, ControlPort, CuePlayer, EventPublisher,
    SettingsRepository,
};

/// Command router for one surface.
///
/// Widgets are attached with [`with_automation`](Self::with_automation) and
/// [`with_hygiene`](Self::with_hygiene); a widget the surface does not
/// support is dropped on attach.
pub struct Controller<R, Q, C, P, T, S> {
    surface: Surface,
    policy: TriggerPolicy,
    automation: Option<CallLoop<R, Q, C, P>>,
    hygiene: Option<ConsoleHygiene<T>>,
    store: S,
    publisher: P,
    settings: Mutex<Settings>,
    /// Serialises merge, persist and commit of settings patches.
    apply_lock: tokio::sync::Mutex<()>,
}

impl<R, Q, C, P, T, S> Controller<R, Q, C, P, T, S>
where
    R: CallStatusReader + Send + Sync + 'static,
    Q: CuePlayer + Send + Sync + 'static,
    C: ClickSimulator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    T: ConsoleTabs + Send + Sync + 'static,
    S: SettingsRepository + Send + Sync,
{
    /// Create a controller with no widgets and default settings.
    pub fn new(surface: Surface, policy: TriggerPolicy, store: S, publisher: P) -> Self {
        Self {
            surface,
            policy,
            automation: None,
            hygiene: None,
            store,
            publisher,
            settings: Mutex::new(Settings::default()),
            apply_lock: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_automation(mut self, call_loop: CallLoop<R, Q, C, P>) -> Self {
        if self.surface.widgets().automation {
            self.automation = Some(call_loop);
        } else {
            tracing::debug!(surface = ?self.surface, "automation not supported here");
        }
        self
    }

    #[must_use]
    pub fn with_hygiene(mut self, hygiene: ConsoleHygiene<T>) -> Self {
        if self.surface.widgets().hygiene {
            self.hygiene = Some(hygiene);
        } else {
            tracing::debug!(surface = ?self.surface, "hygiene not supported here");
        }
        self
    }

    #[must_use]
    pub fn surface(&self) -> Surface {
        self.surface
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        *self.lock_settings()
    }

    fn lock_settings(&self) -> MutexGuard<'_, Settings> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load stored settings and apply them, starting loops whose toggles
    /// are on.
    ///
    /// # Errors
    ///
    /// Returns a storage error if loading or re-saving fails.
    #[tracing::instrument(skip(self), fields(surface = ?self.surface))]
    pub async fn bootstrap(&self) -> Result<Settings, FlowMateError> {
        let stored = self.store.load().await?;
        let settings = self.apply_settings(stored).await?;
        tracing::info!(?settings, "controller ready");
        Ok(settings)
    }

    /// Merge `patch`, persist, push the automation config, then reconcile
    /// the hygiene loops with their toggles.
    ///
    /// Concurrent calls are applied one after the other, each merging over
    /// the settings committed by the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`FlowMateError::Validation`] for a non-finite value (nothing
    /// is changed), or a storage error if persisting fails.
    #[tracing::instrument(skip(self))]
    pub async fn apply_settings(&self, patch: SettingsPatch) -> Result<Settings, FlowMateError> {
        let applying = self.apply_lock.lock().await;
        let mut next = self.settings();
        next.apply(&patch)?;
        self.store.store(&next).await?;
        *self.lock_settings() = next;

        if let Some(call_loop) = &self.automation {
            call_loop.configure(next.automation_config(self.policy));
        }
        if let Some(hygiene) = &self.hygiene {
            hygiene.set_tab_limit(next.tab_limit);
            match (next.tab_looper, hygiene.is_tab_loop_running()) {
                (true, false) => hygiene.start_tab_loop(),
                (false, true) => hygiene.stop_tab_loop(),
                _ => {}
            }
            match (next.toast_looper, hygiene.is_toast_loop_running()) {
                (true, false) => hygiene.start_toast_loop(),
                (false, true) => hygiene.stop_toast_loop(),
                _ => {}
            }
        }

        drop(applying);

        let event = Event::new(EventKind::SettingsApplied { settings: next });
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(error = %err, "failed to publish settings event");
        }
        Ok(next)
    }

    /// Stop every loop on every attached widget.
    pub async fn reset_widgets(&self) {
        if let Some(call_loop) = &self.automation {
            call_loop.stop().await;
        }
        if let Some(hygiene) = &self.hygiene {
            hygiene.stop_all();
        }
    }

    /// Stop everything before the process exits.
    pub async fn shutdown(&self) {
        self.reset_widgets().await;
        tracing::info!("controller stopped");
    }

    /// Build the state report.
    #[must_use]
    pub fn report(&self) -> StateReport {
        let settings = self.settings();
        let automation = match &self.automation {
            Some(call_loop) => {
                let state = call_loop.state();
                let config = call_loop.config();
                AutomationReport {
                    delay: config.delay_seconds,
                    volume: config.volume,
                    loop_state: state,
                    loop_running: state.is_running(),
                    countdown_remaining: state.countdown_remaining(),
                    busy: call_loop.is_busy(),
                    ready_for_next: call_loop.is_ready_for_next(),
                }
            }
            None => AutomationReport {
                delay: settings.asm_delay,
                volume: settings.asm_volume,
                loop_state: LoopState::Idle,
                loop_running: false,
                countdown_remaining: None,
                busy: false,
                ready_for_next: true,
            },
        };
        let hygiene = match &self.hygiene {
            Some(hygiene) => HygieneReport {
                tab_loop: hygiene.is_tab_loop_running(),
                toast_loop: hygiene.is_toast_loop_running(),
                tab_limit: hygiene.tab_limit(),
            },
            None => HygieneReport {
                tab_limit: settings.tab_limit,
                ..HygieneReport::default()
            },
        };
        StateReport {
            surface: self.surface,
            automation,
            hygiene,
        }
    }

    /// Execute one command.
    ///
    /// # Errors
    ///
    /// Returns validation or storage errors from settings changes.
    #[tracing::instrument(skip(self), fields(surface = ?self.surface))]
    pub async fn dispatch(&self, command: Command) -> Result<CommandReply, FlowMateError> {
        match (command, self.automation.as_ref(), self.hygiene.as_ref()) {
            (Command::NextCall, Some(call_loop), _) => {
                let outcome = call_loop.trigger_now().await;
                Ok(CommandReply::NextCall { outcome })
            }
            (Command::StartLoop, Some(call_loop), _) => {
                call_loop.start().await;
                Ok(CommandReply::Ok)
            }
            (Command::StopLoop, Some(call_loop), _) => {
                call_loop.stop().await;
                Ok(CommandReply::Ok)
            }
            (Command::SetDelay { value }, Some(_), _) => {
                self.apply_settings(SettingsPatch::delay(value)).await?;
                Ok(CommandReply::Ok)
            }
            (Command::SetVolume { value }, Some(_), _) => {
                self.apply_settings(SettingsPatch::volume(value)).await?;
                Ok(CommandReply::Ok)
            }
            (Command::KillTabs, _, Some(hygiene)) => {
                let closed = hygiene.kill_tabs().await;
                tracing::info!(closed, "killed tabs");
                Ok(CommandReply::Ok)
            }
            (Command::StartTabLoop, _, Some(hygiene)) => {
                hygiene.start_tab_loop();
                Ok(CommandReply::Ok)
            }
            (Command::StopTabLoop, _, Some(hygiene)) => {
                hygiene.stop_tab_loop();
                Ok(CommandReply::Ok)
            }
            (Command::KillToastsBurst, _, Some(hygiene)) => {
                hygiene.toast_burst();
                Ok(CommandReply::Ok)
            }
            (Command::StartToastLoop, _, Some(hygiene)) => {
                hygiene.start_toast_loop();
                Ok(CommandReply::Ok)
            }
            (Command::StopToastLoop, _, Some(hygiene)) => {
                hygiene.stop_toast_loop();
                Ok(CommandReply::Ok)
            }
            (Command::ApplySettings { payload }, _, _) => {
                self.apply_settings(payload).await?;
                Ok(CommandReply::Ok)
            }
            (Command::ResetWidgets, _, _) => {
                self.reset_widgets().await;
                Ok(CommandReply::Ok)
            }
            (Command::GetState, _, _) => Ok(CommandReply::State {
                state: self.report(),
            }),
            (command, _, _) => {
                tracing::debug!(?command, target = ?command.target(), "widget not attached, ignoring");
                Ok(CommandReply::Ignored)
            }
        }
    }
}

impl<R, Q, C, P, T, S> ControlPort for Controller<R, Q, C, P, T, S>
where
    R: CallStatusReader + Send + Sync + 'static,
    Q: CuePlayer + Send + Sync + 'static,
    C: ClickSimulator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    T: ConsoleTabs + Send + Sync + 'static,
    S: SettingsRepository + Send + Sync,
{
    async fn execute(&self, command: Command) -> Result<CommandReply, FlowMateError> {
        self.dispatch(command).await
    }

    fn state(&self) -> StateReport {
        self.report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_loop::DEFAULT_POLL_INTERVAL;
    use crate::event_bus::InProcessEventBus;
    use crate::next_call::NextCallAction;
    use flowmate_domain::call::RawCallStatus;
    use flowmate_domain::config::{AutomationConfig, Volume};
    use flowmate_domain::cue::Tone;
    use flowmate_domain::error::ValidationError;
    use flowmate_domain::locator::{ClickOutcome, Locator};
    use flowmate_domain::next_call::NextCallPlan;
    use std::future::Future;
    use std::sync::Arc;
    use std::time::Duration;

    struct IdleReader;

    impl CallStatusReader for IdleReader {
        fn read_call_status(
            &self,
        ) -> impl Future<Output = Result<RawCallStatus, FlowMateError>> + Send {
            async { Ok(RawCallStatus::default()) }
        }
    }

    struct MuteCues;

    impl CuePlayer for MuteCues {
        fn play(&self, _tone: Tone, _volume: Volume) {}
    }

    struct OkClicker;

    impl ClickSimulator for OkClicker {
        fn click(
            &self,
            _target: &Locator,
        ) -> impl Future<Output = Result<ClickOutcome, FlowMateError>> + Send {
            async { Ok(ClickOutcome::Clicked) }
        }
    }

    struct NoTabs;

    impl ConsoleTabs for NoTabs {
        fn count_tabs(&self) -> impl Future<Output = Result<usize, FlowMateError>> + Send {
            async { Ok(0) }
        }

        fn close_tab(
            &self,
            _index: usize,
        ) -> impl Future<Output = Result<ClickOutcome, FlowMateError>> + Send {
            async { Ok(ClickOutcome::NotFound) }
        }

        fn dismiss_toasts(&self) -> impl Future<Output = Result<usize, FlowMateError>> + Send {
            async { Ok(0) }
        }
    }

    #[derive(Default)]
    struct InMemorySettings {
        stored: Mutex<Option<Settings>>,
        initial: SettingsPatch,
        /// How long `store` takes to acknowledge a write.
        latency: Duration,
    }

    impl SettingsRepository for InMemorySettings {
        fn load(&self) -> impl Future<Output = Result<SettingsPatch, FlowMateError>> + Send {
            let patch = self.initial;
            async move { Ok(patch) }
        }

        fn store(
            &self,
            settings: &Settings,
        ) -> impl Future<Output = Result<(), FlowMateError>> + Send {
            *self.stored.lock().unwrap() = Some(*settings);
            let latency = self.latency;
            async move {
                if !latency.is_zero() {
                    tokio::time::sleep(latency).await;
                }
                Ok(())
            }
        }
    }

    type TestController = Controller<
        IdleReader,
        MuteCues,
        OkClicker,
        Arc<InProcessEventBus>,
        NoTabs,
        Arc<InMemorySettings>,
    >;

    fn controller(
        surface: Surface,
        store: InMemorySettings,
    ) -> (TestController, Arc<InMemorySettings>, Arc<InProcessEventBus>) {
        let store = Arc::new(store);
        let bus = Arc::new(InProcessEventBus::new(64));
        let action = Arc::new(NextCallAction::new(
            OkClicker,
            Arc::clone(&bus),
            NextCallPlan::default(),
        ));
        let call_loop = CallLoop::new(
            IdleReader,
            MuteCues,
            action,
            AutomationConfig::default(),
            DEFAULT_POLL_INTERVAL,
        );
        let controller = Controller::new(
            surface,
            TriggerPolicy::Standard,
            Arc::clone(&store),
            Arc::clone(&bus),
        )
        .with_automation(call_loop)
        .with_hygiene(ConsoleHygiene::new(NoTabs));
        (controller, store, bus)
    }

    #[tokio::test]
    async fn should_ignore_hygiene_commands_on_softphone() {
        let (controller, _store, _bus) =
            controller(Surface::Softphone, InMemorySettings::default());

        let reply = controller.dispatch(Command::StartTabLoop).await.unwrap();

        assert_eq!(reply, CommandReply::Ignored);
        assert!(!controller.report().hygiene.tab_loop);
    }

    #[tokio::test]
    async fn should_ignore_everything_on_unknown_surface() {
        let (controller, _store, _bus) =
            controller(Surface::Unknown, InMemorySettings::default());

        assert_eq!(
            controller.dispatch(Command::StartLoop).await.unwrap(),
            CommandReply::Ignored
        );
        assert_eq!(
            controller.dispatch(Command::KillTabs).await.unwrap(),
            CommandReply::Ignored
        );
    }

    #[tokio::test]
    async fn should_persist_settings_and_start_toggled_loops() {
        let (controller, store, _bus) = controller(Surface::Crm, InMemorySettings::default());

        let payload = SettingsPatch {
            tab_looper: Some(true),
            tab_limit: Some(6.0),
            ..SettingsPatch::default()
        };
        controller
            .dispatch(Command::ApplySettings { payload })
            .await
            .unwrap();

        let stored = store.stored.lock().unwrap().unwrap();
        assert!(stored.tab_looper);
        assert_eq!(stored.tab_limit, 6);
        let report = controller.report();
        assert!(report.hygiene.tab_loop);
        assert!(!report.hygiene.toast_loop);
        assert_eq!(report.hygiene.tab_limit, 6);

        controller
            .apply_settings(SettingsPatch {
                tab_looper: Some(false),
                ..SettingsPatch::default()
            })
            .await
            .unwrap();
        assert!(!controller.report().hygiene.tab_loop);
    }

    #[tokio::test]
    async fn should_push_delay_into_the_loop() {
        let (controller, _store, _bus) =
            controller(Surface::Softphone, InMemorySettings::default());

        controller
            .dispatch(Command::SetDelay { value: 5.7 })
            .await
            .unwrap();
        controller
            .dispatch(Command::SetVolume { value: 2.0 })
            .await
            .unwrap();

        let report = controller.report();
        assert_eq!(report.automation.delay, 5);
        assert!((report.automation.volume.get() - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_both_updates_when_settings_change_concurrently() {
        let (controller, store, _) = controller(
            Surface::Softphone,
            InMemorySettings {
                latency: Duration::from_millis(5),
                ..InMemorySettings::default()
            },
        );

        let (delay, volume) = tokio::join!(
            controller.dispatch(Command::SetDelay { value: 9.0 }),
            controller.dispatch(Command::SetVolume { value: 0.9 }),
        );
        delay.unwrap();
        volume.unwrap();

        let settings = controller.settings();
        assert_eq!(settings.asm_delay, 9);
        assert_eq!(settings.asm_volume, Volume::new(0.9).unwrap());

        let stored = store.stored.lock().unwrap().unwrap();
        assert_eq!(stored, settings);

        let report = controller.report();
        assert_eq!(report.automation.delay, 9);
        assert_eq!(report.automation.volume, Volume::new(0.9).unwrap());
    }

    #[tokio::test]
    async fn should_reject_non_finite_values_without_storing() {
        let (controller, store, _bus) =
            controller(Surface::Softphone, InMemorySettings::default());

        let err = controller
            .apply_settings(SettingsPatch::delay(f64::INFINITY))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FlowMateError::Validation(ValidationError::NotFinite { field: "asmDelay" })
        ));
        assert!(store.stored.lock().unwrap().is_none());
        assert_eq!(controller.settings(), Settings::default());
    }

    #[tokio::test]
    async fn should_bootstrap_from_stored_settings() {
        let (controller, _store, _bus) = controller(
            Surface::Crm,
            InMemorySettings {
                initial: SettingsPatch {
                    toast_looper: Some(true),
                    asm_delay: Some(4.0),
                    ..SettingsPatch::default()
                },
                ..InMemorySettings::default()
            },
        );

        let settings = controller.bootstrap().await.unwrap();

        assert!(settings.toast_looper);
        let report = controller.report();
        assert!(report.hygiene.toast_loop);
        assert_eq!(report.automation.delay, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn should_start_stop_and_reset_loops() {
        let (controller, _store, _bus) = controller(Surface::Crm, InMemorySettings::default());

        controller.dispatch(Command::StartLoop).await.unwrap();
        controller.dispatch(Command::StartToastLoop).await.unwrap();
        assert!(controller.report().automation.loop_running);
        assert!(controller.report().hygiene.toast_loop);

        controller.dispatch(Command::ResetWidgets).await.unwrap();

        let report = controller.report();
        assert_eq!(report.automation.loop_state, LoopState::Idle);
        assert!(!report.hygiene.toast_loop);
    }

    #[tokio::test(start_paused = true)]
    async fn should_run_manual_next_call() {
        let (controller, _store, _bus) =
            controller(Surface::Softphone, InMemorySettings::default());

        let reply = controller.dispatch(Command::NextCall).await.unwrap();

        let CommandReply::NextCall { outcome } = reply else {
            panic!("expected next-call reply, got {reply:?}");
        };
        assert!(matches!(
            outcome,
            flowmate_domain::next_call::NextCallOutcome::Completed { .. }
        ));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(controller.report().automation.ready_for_next);
    }

    #[tokio::test]
    async fn should_report_state_with_surface() {
        let (controller, _store, _bus) = controller(Surface::Crm, InMemorySettings::default());

        let reply = controller.dispatch(Command::GetState).await.unwrap();

        let CommandReply::State { state } = reply else {
            panic!("expected state reply, got {reply:?}");
        };
        assert_eq!(state.surface, Surface::Crm);
        assert_eq!(state.automation.delay, 3);
        assert!(state.automation.ready_for_next);
        assert_eq!(state.hygiene.tab_limit, 10);
    }

    #[tokio::test]
    async fn should_publish_settings_applied() {
        let (controller, _store, bus) = controller(Surface::Crm, InMemorySettings::default());
        let mut rx = bus.subscribe();

        controller
            .apply_settings(SettingsPatch::delay(9.0))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        let EventKind::SettingsApplied { settings } = event.kind else {
            panic!("expected settings event, got {:?}", event.kind);
        };
        assert_eq!(settings.asm_delay, 9);
    }
}
