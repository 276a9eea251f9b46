//! Call snapshot: what the softphone's call-status header shows right now.
//!
//! The softphone renders the call state as `": Live Call"` next to the call
//! type (`"Inbound Call"`, `"Agent Call"`, …), and a stopwatch while the
//! call is dialing. A [`CallSnapshot`] is rebuilt from that text on every
//! poll tick; nothing is carried between ticks.

use serde::{Deserialize, Serialize};

/// The three text fields read from the call-status header, already trimmed.
///
/// Every field is optional because the header is owned by an external page
/// that may not be rendered (no active session, frame reloading, …).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCallStatus {
    pub state_text: Option<String>,
    pub call_type_text: Option<String>,
    pub timer_text: Option<String>,
}

impl RawCallStatus {
    /// Whether no field could be read at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state_text.is_none() && self.call_type_text.is_none() && self.timer_text.is_none()
    }
}

/// Call state label shown by the softphone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Dialing,
    LiveCall,
    WrapUp,
    /// Any label this system does not act on (`"Ready"`, `"Not Ready"`, …).
    Other(String),
}

impl CallState {
    /// Parse a state label such as `": Live Call"`.
    ///
    /// Returns `None` for an empty label.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let label = text.trim().trim_start_matches(':').trim();
        match label {
            "" => None,
            "Dialing" => Some(Self::Dialing),
            "Live Call" => Some(Self::LiveCall),
            "Wrap Up" => Some(Self::WrapUp),
            other => Some(Self::Other(other.to_string())),
        }
    }
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dialing => f.write_str("Dialing"),
            Self::LiveCall => f.write_str("Live Call"),
            Self::WrapUp => f.write_str("Wrap Up"),
            Self::Other(label) => f.write_str(label),
        }
    }
}

/// Call type label shown next to the state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Inbound,
    Agent,
    Other(String),
}

impl CallType {
    /// Parse a call type label such as `"Inbound Call"`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "" => None,
            "Inbound Call" => Some(Self::Inbound),
            "Agent Call" => Some(Self::Agent),
            other => Some(Self::Other(other.to_string())),
        }
    }
}

/// Parse the dial stopwatch (`mm:ss` or `hh:mm:ss`) into total seconds.
///
/// Minutes and hours count toward the result, so `01:05` is 65 and not 5.
/// Dial triggers compare against the whole time spent dialing.
///
/// Returns `None` when the text is not a well-formed stopwatch.
#[must_use]
pub fn parse_elapsed(text: &str) -> Option<u32> {
    let parts: Vec<u32> = text
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect::<Option<_>>()?;

    match parts.as_slice() {
        [minutes, seconds] => minutes.checked_mul(60)?.checked_add(*seconds),
        [hours, minutes, seconds] => hours
            .checked_mul(3600)?
            .checked_add(minutes.checked_mul(60)?)?
            .checked_add(*seconds),
        _ => None,
    }
}

/// Observation of the call-status header at one poll tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSnapshot {
    pub state: Option<CallState>,
    /// Seconds shown on the dial stopwatch; `0` when absent or unreadable.
    pub dialing_elapsed_seconds: u32,
    pub call_type: Option<CallType>,
}

impl CallSnapshot {
    /// Build a snapshot from the raw header text.
    #[must_use]
    pub fn from_raw(raw: &RawCallStatus) -> Self {
        Self {
            state: raw.state_text.as_deref().and_then(CallState::parse),
            dialing_elapsed_seconds: raw
                .timer_text
                .as_deref()
                .and_then(parse_elapsed)
                .unwrap_or(0),
            call_type: raw.call_type_text.as_deref().and_then(CallType::parse),
        }
    }

    /// Whether the snapshot carries a call type equal to `Inbound Call`.
    #[must_use]
    pub fn is_inbound(&self) -> bool {
        matches!(self.call_type, Some(CallType::Inbound))
    }
}

impl From<&RawCallStatus> for CallSnapshot {
    fn from(raw: &RawCallStatus) -> Self {
        Self::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(state: &str, call_type: &str, timer: &str) -> RawCallStatus {
        RawCallStatus {
            state_text: Some(state.to_string()),
            call_type_text: Some(call_type.to_string()),
            timer_text: Some(timer.to_string()),
        }
    }

    #[test]
    fn should_parse_state_label_with_leading_colon() {
        assert_eq!(CallState::parse(": Live Call"), Some(CallState::LiveCall));
        assert_eq!(CallState::parse(": Dialing"), Some(CallState::Dialing));
        assert_eq!(CallState::parse(":  Wrap Up "), Some(CallState::WrapUp));
    }

    #[test]
    fn should_keep_unknown_state_label_verbatim() {
        assert_eq!(
            CallState::parse(": Not Ready"),
            Some(CallState::Other("Not Ready".to_string()))
        );
    }

    #[test]
    fn should_return_none_for_blank_state_label() {
        assert_eq!(CallState::parse("  "), None);
        assert_eq!(CallState::parse(":"), None);
    }

    #[test]
    fn should_parse_call_types() {
        assert_eq!(CallType::parse("Inbound Call"), Some(CallType::Inbound));
        assert_eq!(CallType::parse(" Agent Call "), Some(CallType::Agent));
        assert_eq!(
            CallType::parse("Outbound Call"),
            Some(CallType::Other("Outbound Call".to_string()))
        );
    }

    #[test]
    fn should_parse_minutes_and_seconds_stopwatch() {
        assert_eq!(parse_elapsed("00:35"), Some(35));
        assert_eq!(parse_elapsed("01:05"), Some(65));
    }

    #[test]
    fn should_parse_hours_minutes_seconds_stopwatch() {
        assert_eq!(parse_elapsed("1:02:03"), Some(3723));
    }

    #[test]
    fn should_reject_malformed_stopwatch() {
        assert_eq!(parse_elapsed(""), None);
        assert_eq!(parse_elapsed("35"), None);
        assert_eq!(parse_elapsed("aa:bb"), None);
        assert_eq!(parse_elapsed("1:2:3:4"), None);
    }

    #[test]
    fn should_build_snapshot_from_raw_header() {
        let snapshot = CallSnapshot::from_raw(&raw(": Dialing", "Outbound Call", "00:12"));
        assert_eq!(snapshot.state, Some(CallState::Dialing));
        assert_eq!(snapshot.dialing_elapsed_seconds, 12);
        assert!(!snapshot.is_inbound());
    }

    #[test]
    fn should_default_elapsed_to_zero_when_timer_unreadable() {
        let snapshot = CallSnapshot::from_raw(&raw(": Dialing", "Outbound Call", "--:--"));
        assert_eq!(snapshot.dialing_elapsed_seconds, 0);
    }

    #[test]
    fn should_build_empty_snapshot_from_empty_header() {
        let status = RawCallStatus::default();
        assert!(status.is_empty());
        assert_eq!(CallSnapshot::from(&status), CallSnapshot::default());
    }

    #[test]
    fn should_flag_inbound_calls() {
        let snapshot = CallSnapshot::from_raw(&raw(": Live Call", "Inbound Call", "00:01"));
        assert!(snapshot.is_inbound());
    }
}
