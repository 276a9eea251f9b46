//! Automation configuration pushed into the loop.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::trigger::TriggerPolicy;

/// Default countdown length in seconds.
pub const DEFAULT_DELAY_SECS: u32 = 3;

/// Default cue loudness.
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Cue loudness, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Volume(f32);

impl Volume {
    /// Silent.
    pub const MUTE: Self = Self(0.0);

    /// Clamp `value` into `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotFinite`] for `NaN` or infinite input.
    pub fn new(value: f32) -> Result<Self, ValidationError> {
        if value.is_finite() {
            Ok(Self(value.clamp(0.0, 1.0)))
        } else {
            Err(ValidationError::NotFinite { field: "volume" })
        }
    }

    /// The gain as a plain float.
    #[must_use]
    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(DEFAULT_VOLUME)
    }
}

impl TryFrom<f32> for Volume {
    type Error = ValidationError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Volume> for f32 {
    fn from(volume: Volume) -> Self {
        volume.0
    }
}

/// Configuration read by the automaton on every tick.
///
/// A new value replaces the old one immediately, but a countdown that is
/// already running keeps the length it started with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub delay_seconds: u32,
    pub volume: Volume,
    pub policy: TriggerPolicy,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            delay_seconds: DEFAULT_DELAY_SECS,
            volume: Volume::default(),
            policy: TriggerPolicy::default(),
        }
    }
}

impl AutomationConfig {
    /// Replace the delay, clamping negative values to zero.
    #[must_use]
    pub fn with_delay(mut self, seconds: i64) -> Self {
        self.delay_seconds = u32::try_from(seconds.max(0)).unwrap_or(u32::MAX);
        self
    }

    #[must_use]
    pub fn with_volume(mut self, volume: Volume) -> Self {
        self.volume = volume;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: TriggerPolicy) -> Self {
        self.policy = policy;
        self
    }
}
