//! Call automaton: the polling/countdown state machine.
//!
//! The automaton is a pure value. Every input (start, stop, poll tick,
//! countdown tick) mutates its [`LoopState`] and returns the list of
//! [`Effect`]s the runtime must perform: arm or cancel timers, play cues,
//! run the next-call sequence. It owns no timers and performs no IO, so
//! the whole decision logic is testable without a page or a clock.
//!
//! ```text
//!            start                 predicate holds
//!   Idle ───────────▶ Polling ─────────────────────▶ Countdown(n)
//!    ▲                  ▲  ▲                             │ tick, n > 0: cue, n -= 1
//!    │ stop (any)       │  └─── tick, n == 0: final cue, ┘
//!    └──────────────────┘       trigger next call
//! ```

use serde::{Deserialize, Serialize};

use crate::call::CallSnapshot;
use crate::config::AutomationConfig;
use crate::cue::Cue;
use crate::trigger::TriggerGate;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoopState {
    /// Not running.
    #[default]
    Idle,
    /// Running, watching the call state.
    Polling,
    /// Running, `remaining` seconds before the next-call sequence fires.
    Countdown { remaining: u32 },
}

impl LoopState {
    /// Whether the loop is started (polling or counting down).
    #[must_use]
    pub fn is_running(self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Seconds left on the active countdown, if any.
    #[must_use]
    pub fn countdown_remaining(self) -> Option<u32> {
        match self {
            Self::Countdown { remaining } => Some(remaining),
            Self::Idle | Self::Polling => None,
        }
    }
}

/// Work the runtime must carry out after a transition, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Arm the periodic poll timer.
    StartPolling,
    /// Cancel the poll timer.
    StopPolling,
    /// Arm the one-second countdown timer for a countdown of `seconds`.
    StartCountdown { seconds: u32 },
    /// A countdown second elapsed with `remaining` seconds still to go.
    CountdownTick { remaining: u32 },
    /// Cancel the countdown timer.
    StopCountdown,
    /// Play an audible cue.
    PlayCue(Cue),
    /// Run the next-call sequence.
    TriggerNextCall,
}

/// The polling/countdown state machine.
#[derive(Debug, Clone, Default)]
pub struct CallAutomaton {
    state: LoopState,
}

impl CallAutomaton {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// `Idle → Polling`. No-op when already running.
    pub fn start(&mut self) -> Vec<Effect> {
        if self.state.is_running() {
            return Vec::new();
        }
        self.state = LoopState::Polling;
        vec![Effect::StartPolling]
    }

    /// Any state `→ Idle`, cancelling every timer. Never triggers the sequence.
    pub fn stop(&mut self) -> Vec<Effect> {
        let effects = match self.state {
            LoopState::Idle => Vec::new(),
            LoopState::Polling => vec![Effect::StopPolling],
            LoopState::Countdown { .. } => vec![Effect::StopCountdown, Effect::StopPolling],
        };
        self.state = LoopState::Idle;
        effects
    }

    /// Abort a running countdown and fall back to `Polling`.
    pub fn cancel_countdown(&mut self) -> Vec<Effect> {
        if let LoopState::Countdown { .. } = self.state {
            self.state = LoopState::Polling;
            vec![Effect::StopCountdown]
        } else {
            Vec::new()
        }
    }

    /// Handle a poll tick.
    ///
    /// `snapshot` is `None` when the call-status header could not be read;
    /// that is treated as "condition not met".
    pub fn poll(
        &mut self,
        snapshot: Option<&CallSnapshot>,
        ready_for_next: bool,
        config: &AutomationConfig,
    ) -> Vec<Effect> {
        if !self.state.is_running() {
            return Vec::new();
        }
        let Some(snapshot) = snapshot else {
            return Vec::new();
        };

        let gate = TriggerGate {
            countdown_active: self.state.countdown_remaining().is_some(),
            ready_for_next,
        };
        match config
            .policy
            .countdown_for(snapshot, gate, config.delay_seconds)
        {
            Some(seconds) => {
                self.state = LoopState::Countdown { remaining: seconds };
                vec![
                    Effect::PlayCue(Cue::Initial),
                    Effect::StartCountdown { seconds },
                ]
            }
            None => Vec::new(),
        }
    }

    /// Handle a countdown tick.
    ///
    /// Ticks arriving outside a countdown (a timer racing a stop) are ignored.
    pub fn countdown_tick(&mut self) -> Vec<Effect> {
        match self.state {
            LoopState::Countdown { remaining: 0 } => {
                self.state = LoopState::Polling;
                vec![
                    Effect::PlayCue(Cue::Final),
                    Effect::StopCountdown,
                    Effect::TriggerNextCall,
                ]
            }
            LoopState::Countdown { remaining } => {
                self.state = LoopState::Countdown {
                    remaining: remaining - 1,
                };
                vec![
                    Effect::PlayCue(Cue::Tick),
                    Effect::CountdownTick { remaining },
                ]
            }
            LoopState::Idle | LoopState::Polling => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::{CallState, CallType};
    use crate::trigger::TriggerPolicy;

    fn live_call() -> CallSnapshot {
        CallSnapshot {
            state: Some(CallState::LiveCall),
            dialing_elapsed_seconds: 0,
            call_type: Some(CallType::Other("Outbound Call".to_string())),
        }
    }

    fn config(delay: u32) -> AutomationConfig {
        AutomationConfig {
            delay_seconds: delay,
            ..AutomationConfig::default()
        }
    }

    fn running() -> CallAutomaton {
        let mut automaton = CallAutomaton::new();
        automaton.start();
        automaton
    }

    #[test]
    fn should_start_polling_from_idle() {
        let mut automaton = CallAutomaton::new();
        assert_eq!(automaton.start(), vec![Effect::StartPolling]);
        assert_eq!(automaton.state(), LoopState::Polling);
    }

    #[test]
    fn should_ignore_second_start() {
        let mut automaton = running();
        assert!(automaton.start().is_empty());
        assert_eq!(automaton.state(), LoopState::Polling);
    }

    #[test]
    fn should_ignore_second_start_during_countdown() {
        let mut automaton = running();
        automaton.poll(Some(&live_call()), true, &config(3));
        assert!(automaton.start().is_empty());
        assert_eq!(automaton.state(), LoopState::Countdown { remaining: 3 });
    }

    #[test]
    fn should_not_react_to_poll_while_idle() {
        let mut automaton = CallAutomaton::new();
        assert!(automaton.poll(Some(&live_call()), true, &config(3)).is_empty());
        assert_eq!(automaton.state(), LoopState::Idle);
    }

    #[test]
    fn should_start_countdown_with_initial_cue() {
        let mut automaton = running();
        let effects = automaton.poll(Some(&live_call()), true, &config(3));
        assert_eq!(
            effects,
            vec![
                Effect::PlayCue(Cue::Initial),
                Effect::StartCountdown { seconds: 3 },
            ]
        );
        assert_eq!(automaton.state(), LoopState::Countdown { remaining: 3 });
    }

    #[test]
    fn should_treat_missing_snapshot_as_condition_not_met() {
        let mut automaton = running();
        assert!(automaton.poll(None, true, &config(3)).is_empty());
        assert_eq!(automaton.state(), LoopState::Polling);
    }

    #[test]
    fn should_not_start_countdown_until_ready() {
        let mut automaton = running();
        assert!(automaton.poll(Some(&live_call()), false, &config(3)).is_empty());
        assert_eq!(automaton.state(), LoopState::Polling);
    }

    #[test]
    fn should_not_overlap_countdowns() {
        let mut automaton = running();
        automaton.poll(Some(&live_call()), true, &config(3));
        assert!(automaton.poll(Some(&live_call()), true, &config(3)).is_empty());
        assert_eq!(automaton.state(), LoopState::Countdown { remaining: 3 });
    }

    #[test]
    fn should_cue_three_two_one_then_fire_once() {
        let mut automaton = running();
        automaton.poll(Some(&live_call()), true, &config(3));

        let mut ticks = Vec::new();
        let mut triggers = 0;
        let mut finals = 0;
        for _ in 0..4 {
            for effect in automaton.countdown_tick() {
                match effect {
                    Effect::CountdownTick { remaining } => ticks.push(remaining),
                    Effect::TriggerNextCall => triggers += 1,
                    Effect::PlayCue(Cue::Final) => finals += 1,
                    _ => {}
                }
            }
        }

        assert_eq!(ticks, vec![3, 2, 1]);
        assert_eq!(finals, 1);
        assert_eq!(triggers, 1);
        assert_eq!(automaton.state(), LoopState::Polling);
        assert!(automaton.countdown_tick().is_empty());
    }

    #[test]
    fn should_fire_on_first_tick_for_zero_delay() {
        let mut automaton = running();
        automaton.poll(Some(&live_call()), true, &config(0));
        assert_eq!(
            automaton.countdown_tick(),
            vec![
                Effect::PlayCue(Cue::Final),
                Effect::StopCountdown,
                Effect::TriggerNextCall,
            ]
        );
        assert_eq!(automaton.state(), LoopState::Polling);
    }

    #[test]
    fn should_cancel_countdown_on_stop_without_triggering() {
        let mut automaton = running();
        automaton.poll(Some(&live_call()), true, &config(3));
        automaton.countdown_tick();

        let effects = automaton.stop();
        assert_eq!(effects, vec![Effect::StopCountdown, Effect::StopPolling]);
        assert_eq!(automaton.state(), LoopState::Idle);
        assert!(automaton.countdown_tick().is_empty());
    }

    #[test]
    fn should_stop_from_polling() {
        let mut automaton = running();
        assert_eq!(automaton.stop(), vec![Effect::StopPolling]);
        assert!(automaton.stop().is_empty());
    }

    #[test]
    fn should_return_to_polling_when_countdown_cancelled() {
        let mut automaton = running();
        automaton.poll(Some(&live_call()), true, &config(3));
        assert_eq!(automaton.cancel_countdown(), vec![Effect::StopCountdown]);
        assert_eq!(automaton.state(), LoopState::Polling);
        assert!(automaton.cancel_countdown().is_empty());
    }

    #[test]
    fn should_keep_running_countdown_length_when_config_changes() {
        let mut automaton = running();
        automaton.poll(Some(&live_call()), true, &config(3));
        automaton.poll(Some(&live_call()), true, &config(10));
        assert_eq!(automaton.state(), LoopState::Countdown { remaining: 3 });
    }

    #[test]
    fn should_apply_wrap_up_policy_from_config() {
        let mut automaton = running();
        let wrap_up = CallSnapshot {
            state: Some(CallState::WrapUp),
            dialing_elapsed_seconds: 0,
            call_type: Some(CallType::Agent),
        };
        let cfg = config(3).with_policy(TriggerPolicy::WrapUpAware);
        automaton.poll(Some(&wrap_up), true, &cfg);
        assert_eq!(automaton.state(), LoopState::Countdown { remaining: 0 });
    }

    #[test]
    fn should_serialize_loop_state_with_tag() {
        let json = serde_json::to_value(LoopState::Countdown { remaining: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"state": "countdown", "remaining": 2}));
    }
}
