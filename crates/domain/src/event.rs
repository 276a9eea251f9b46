//! Event: an immutable record of something the controller did.
//!
//! Events are published on the in-process bus and relayed to panels, which
//! render them (for example the `STOP LOOP (3s)` label during a countdown).

use serde::{Deserialize, Serialize};

use crate::id::RunId;
use crate::next_call::NextCallOutcome;
use crate::settings::Settings;
use crate::time::{Timestamp, now};

/// A timestamped [`EventKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    /// Stamp `kind` with the current time.
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            timestamp: now(),
            kind,
        }
    }
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Self::new(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    LoopStarted,
    LoopStopped,
    CountdownStarted { seconds: u32 },
    CountdownTick { remaining: u32 },
    CountdownCancelled,
    NextCallStarted { run_id: RunId },
    NextCallFinished { run_id: RunId, outcome: NextCallOutcome },
    SettingsApplied { settings: Settings },
}
