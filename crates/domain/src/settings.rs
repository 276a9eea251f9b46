//! Persisted operator settings and partial updates to them.
//!
//! Keys are camelCase on the wire and in storage (`tabLooper`, `asmDelay`,
//! ...). Keys that are not recognised are ignored.

use serde::{Deserialize, Serialize};

use crate::config::{AutomationConfig, DEFAULT_DELAY_SECS, Volume};
use crate::error::ValidationError;
use crate::hygiene::DEFAULT_TAB_LIMIT;
use crate::trigger::TriggerPolicy;

pub const KEY_TAB_LOOPER: &str = "tabLooper";
pub const KEY_TOAST_LOOPER: &str = "toastLooper";
pub const KEY_TAB_LIMIT: &str = "tabLimit";
pub const KEY_ASM_DELAY: &str = "asmDelay";
pub const KEY_ASM_VOLUME: &str = "asmVolume";

/// The complete, validated settings set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub tab_looper: bool,
    pub toast_looper: bool,
    pub tab_limit: u32,
    pub asm_delay: u32,
    pub asm_volume: Volume,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tab_looper: false,
            toast_looper: false,
            tab_limit: DEFAULT_TAB_LIMIT,
            asm_delay: DEFAULT_DELAY_SECS,
            asm_volume: Volume::default(),
        }
    }
}

/// Any subset of the settings, as sent by a client or loaded from storage.
///
/// Numbers arrive untyped and are normalised by [`Settings::apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_looper: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toast_looper: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asm_delay: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asm_volume: Option<f64>,
}

impl SettingsPatch {
    #[must_use]
    pub fn delay(value: f64) -> Self {
        Self {
            asm_delay: Some(value),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn volume(value: f64) -> Self {
        Self {
            asm_volume: Some(value),
            ..Self::default()
        }
    }

    /// Build a patch from stored `(key, value)` rows. Unknown keys and
    /// values of the wrong type are skipped.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: AsRef<str>,
    {
        let mut patch = Self::default();
        for (key, value) in entries {
            match key.as_ref() {
                KEY_TAB_LOOPER => patch.tab_looper = value.as_bool(),
                KEY_TOAST_LOOPER => patch.toast_looper = value.as_bool(),
                KEY_TAB_LIMIT => patch.tab_limit = value.as_f64(),
                KEY_ASM_DELAY => patch.asm_delay = value.as_f64(),
                KEY_ASM_VOLUME => patch.asm_volume = value.as_f64(),
                _ => {}
            }
        }
        patch
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn whole_number(field: &'static str, value: f64) -> Result<u32, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    // float-to-int `as` saturates
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let seconds = value.floor().max(0.0) as u32;
    Ok(seconds)
}

impl Settings {
    /// Merge `patch` over the current values.
    ///
    /// All fields are validated before any is written, so a rejected patch
    /// leaves the settings untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotFinite`] when a numeric field is `NaN`
    /// or infinite.
    pub fn apply(&mut self, patch: &SettingsPatch) -> Result<(), ValidationError> {
        let tab_limit = patch
            .tab_limit
            .map(|value| whole_number(KEY_TAB_LIMIT, value))
            .transpose()?;
        let asm_delay = patch
            .asm_delay
            .map(|value| whole_number(KEY_ASM_DELAY, value))
            .transpose()?;
        let asm_volume = patch
            .asm_volume
            .map(|value| {
                if value.is_finite() {
                    #[allow(clippy::cast_possible_truncation)]
                    let value = value as f32;
                    Volume::new(value)
                } else {
                    Err(ValidationError::NotFinite {
                        field: KEY_ASM_VOLUME,
                    })
                }
            })
            .transpose()?;

        if let Some(value) = patch.tab_looper {
            self.tab_looper = value;
        }
        if let Some(value) = patch.toast_looper {
            self.toast_looper = value;
        }
        if let Some(value) = tab_limit {
            self.tab_limit = value;
        }
        if let Some(value) = asm_delay {
            self.asm_delay = value;
        }
        if let Some(value) = asm_volume {
            self.asm_volume = value;
        }
        Ok(())
    }

    /// The automation configuration these settings describe.
    #[must_use]
    pub fn automation_config(&self, policy: TriggerPolicy) -> AutomationConfig {
        AutomationConfig {
            delay_seconds: self.asm_delay,
            volume: self.asm_volume,
            policy,
        }
    }

    /// One `(key, value)` pair per setting, for key-value storage.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, serde_json::Value)> {
        vec![
            (KEY_TAB_LOOPER, serde_json::Value::Bool(self.tab_looper)),
            (KEY_TOAST_LOOPER, serde_json::Value::Bool(self.toast_looper)),
            (KEY_TAB_LIMIT, serde_json::Value::from(self.tab_limit)),
            (KEY_ASM_DELAY, serde_json::Value::from(self.asm_delay)),
            (
                KEY_ASM_VOLUME,
                serde_json::Value::from(f64::from(self.asm_volume.get())),
            ),
        ]
    }
}
