//! Trigger predicate: decides when a countdown may start.
//!
//! The predicate encodes business policy: a live call (or one that has
//! been dialing long enough that it is expected to connect) should be
//! wrapped up preemptively, inbound calls never are.

use serde::{Deserialize, Serialize};

use crate::call::{CallSnapshot, CallState, CallType};

/// Dialing calls become eligible once the stopwatch reaches this many seconds.
pub const DIAL_THRESHOLD_SECS: u32 = 35;

/// Which variant of the trigger predicate to apply.
///
/// Two variants of the predicate exist in the field. They are kept apart
/// rather than merged; operators choose one in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// Live calls, or calls dialing for at least [`DIAL_THRESHOLD_SECS`].
    #[default]
    Standard,
    /// As [`Standard`](Self::Standard), plus calls sitting in *Wrap Up*.
    /// An agent call in wrap-up advances with no countdown at all.
    WrapUpAware,
}

/// Everything the predicate needs besides the snapshot.
#[derive(Debug, Clone, Copy)]
pub struct TriggerGate {
    /// A countdown is already running.
    pub countdown_active: bool,
    /// The previous next-call sequence has finished.
    pub ready_for_next: bool,
}

impl TriggerPolicy {
    /// Evaluate the predicate and return the countdown length to start with.
    ///
    /// `None` means "condition not met". `configured_delay` is the operator's
    /// delay; the wrap-up-aware policy may shorten it to zero.
    #[must_use]
    pub fn countdown_for(
        self,
        snapshot: &CallSnapshot,
        gate: TriggerGate,
        configured_delay: u32,
    ) -> Option<u32> {
        if gate.countdown_active || !gate.ready_for_next || snapshot.is_inbound() {
            return None;
        }

        let state = snapshot.state.as_ref()?;
        let eligible = match state {
            CallState::LiveCall => true,
            CallState::Dialing => snapshot.dialing_elapsed_seconds >= DIAL_THRESHOLD_SECS,
            CallState::WrapUp => self == Self::WrapUpAware,
            CallState::Other(_) => false,
        };
        if !eligible {
            return None;
        }

        let agent_wrap_up = matches!(state, CallState::WrapUp)
            && matches!(snapshot.call_type, Some(CallType::Agent));
        if self == Self::WrapUpAware && agent_wrap_up {
            Some(0)
        } else {
            Some(configured_delay)
        }
    }

    /// Boolean form of [`countdown_for`](Self::countdown_for).
    #[must_use]
    pub fn should_trigger(self, snapshot: &CallSnapshot, gate: TriggerGate) -> bool {
        self.countdown_for(snapshot, gate, 0).is_some()
    }
}

impl std::fmt::Display for TriggerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::WrapUpAware => f.write_str("wrap_up_aware"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN: TriggerGate = TriggerGate {
        countdown_active: false,
        ready_for_next: true,
    };

    fn snapshot(state: CallState, elapsed: u32, call_type: Option<CallType>) -> CallSnapshot {
        CallSnapshot {
            state: Some(state),
            dialing_elapsed_seconds: elapsed,
            call_type,
        }
    }

    fn outbound() -> Option<CallType> {
        Some(CallType::Other("Outbound Call".to_string()))
    }

    #[test]
    fn should_trigger_on_live_call() {
        let s = snapshot(CallState::LiveCall, 0, outbound());
        assert_eq!(TriggerPolicy::Standard.countdown_for(&s, OPEN, 3), Some(3));
    }

    #[test]
    fn should_not_trigger_while_dialing_below_threshold() {
        let s = snapshot(CallState::Dialing, 34, outbound());
        assert!(!TriggerPolicy::Standard.should_trigger(&s, OPEN));
    }

    #[test]
    fn should_trigger_while_dialing_at_threshold() {
        let s = snapshot(CallState::Dialing, 35, outbound());
        assert!(TriggerPolicy::Standard.should_trigger(&s, OPEN));
    }

    #[test]
    fn should_never_trigger_on_inbound_calls() {
        for policy in [TriggerPolicy::Standard, TriggerPolicy::WrapUpAware] {
            for state in [CallState::LiveCall, CallState::Dialing, CallState::WrapUp] {
                let s = snapshot(state, 600, Some(CallType::Inbound));
                assert!(!policy.should_trigger(&s, OPEN));
            }
        }
    }

    #[test]
    fn should_not_trigger_while_countdown_active() {
        let s = snapshot(CallState::LiveCall, 0, outbound());
        let gate = TriggerGate {
            countdown_active: true,
            ready_for_next: true,
        };
        assert!(!TriggerPolicy::Standard.should_trigger(&s, gate));
    }

    #[test]
    fn should_not_trigger_until_ready_for_next() {
        let s = snapshot(CallState::LiveCall, 0, outbound());
        let gate = TriggerGate {
            countdown_active: false,
            ready_for_next: false,
        };
        assert!(!TriggerPolicy::Standard.should_trigger(&s, gate));
    }

    #[test]
    fn should_not_trigger_without_state_label() {
        let s = CallSnapshot {
            state: None,
            dialing_elapsed_seconds: 90,
            call_type: outbound(),
        };
        assert!(!TriggerPolicy::WrapUpAware.should_trigger(&s, OPEN));
    }

    #[test]
    fn should_ignore_wrap_up_under_standard_policy() {
        let s = snapshot(CallState::WrapUp, 0, Some(CallType::Agent));
        assert!(!TriggerPolicy::Standard.should_trigger(&s, OPEN));
    }

    #[test]
    fn should_trigger_on_wrap_up_under_wrap_up_aware_policy() {
        let s = snapshot(CallState::WrapUp, 0, outbound());
        assert_eq!(TriggerPolicy::WrapUpAware.countdown_for(&s, OPEN, 5), Some(5));
    }

    #[test]
    fn should_skip_countdown_for_agent_call_in_wrap_up() {
        let s = snapshot(CallState::WrapUp, 0, Some(CallType::Agent));
        assert_eq!(TriggerPolicy::WrapUpAware.countdown_for(&s, OPEN, 5), Some(0));
    }

    #[test]
    fn should_keep_configured_delay_for_live_agent_call() {
        let s = snapshot(CallState::LiveCall, 0, Some(CallType::Agent));
        assert_eq!(TriggerPolicy::WrapUpAware.countdown_for(&s, OPEN, 4), Some(4));
    }

    #[test]
    fn should_deserialize_policy_from_snake_case() {
        let policy: TriggerPolicy = serde_json::from_str("\"wrap_up_aware\"").unwrap();
        assert_eq!(policy, TriggerPolicy::WrapUpAware);
        assert_eq!(policy.to_string(), "wrap_up_aware");
    }
}
