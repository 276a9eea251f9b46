//! Audible countdown cues.

use serde::{Deserialize, Serialize};

/// Which point of the countdown a cue marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// The countdown has just started.
    Initial,
    /// One second has elapsed, more remain.
    Tick,
    /// The countdown expired; the next-call sequence is about to run.
    Final,
}

/// Oscillator shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Triangle,
}

/// A single beep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
    pub waveform: Waveform,
}

impl Cue {
    /// The tone profile for this cue: high, mid, then low.
    #[must_use]
    pub fn tone(self) -> Tone {
        match self {
            Self::Initial => Tone {
                frequency_hz: 1600,
                duration_ms: 150,
                waveform: Waveform::Triangle,
            },
            Self::Tick => Tone {
                frequency_hz: 800,
                duration_ms: 150,
                waveform: Waveform::Sine,
            },
            Self::Final => Tone {
                frequency_hz: 400,
                duration_ms: 300,
                waveform: Waveform::Sine,
            },
        }
    }
}
