//! Controller command protocol.
//!
//! Commands are JSON objects tagged by `type`, using the wire names the
//! settings panel sends (`ASM_NEXT_CALL`, `SF_KILL_TABS`, ...).

use serde::{Deserialize, Serialize};

use crate::automaton::LoopState;
use crate::config::Volume;
use crate::next_call::NextCallOutcome;
use crate::settings::SettingsPatch;
use crate::surface::Surface;

/// A request sent to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    #[serde(rename = "ASM_NEXT_CALL")]
    NextCall,
    #[serde(rename = "ASM_START_LOOP")]
    StartLoop,
    #[serde(rename = "ASM_STOP_LOOP")]
    StopLoop,
    #[serde(rename = "ASM_SET_DELAY")]
    SetDelay { value: f64 },
    #[serde(rename = "ASM_SET_VOLUME")]
    SetVolume { value: f64 },
    #[serde(rename = "SF_KILL_TABS")]
    KillTabs,
    #[serde(rename = "SF_START_TAB_LOOP")]
    StartTabLoop,
    #[serde(rename = "SF_STOP_TAB_LOOP")]
    StopTabLoop,
    #[serde(rename = "SF_KILL_TOASTS_BURST")]
    KillToastsBurst,
    #[serde(rename = "SF_START_TOAST_LOOP")]
    StartToastLoop,
    #[serde(rename = "SF_STOP_TOAST_LOOP")]
    StopToastLoop,
    #[serde(rename = "APPLY_SETTINGS")]
    ApplySettings { payload: SettingsPatch },
    #[serde(rename = "RESET_WIDGETS")]
    ResetWidgets,
    #[serde(rename = "GET_STATE")]
    GetState,
}

/// Widget a command is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Automation,
    Hygiene,
    /// Handled by the controller itself, whatever the surface.
    Controller,
}

impl Command {
    #[must_use]
    pub fn target(&self) -> Target {
        match self {
            Self::NextCall
            | Self::StartLoop
            | Self::StopLoop
            | Self::SetDelay { .. }
            | Self::SetVolume { .. } => Target::Automation,
            Self::KillTabs
            | Self::StartTabLoop
            | Self::StopTabLoop
            | Self::KillToastsBurst
            | Self::StartToastLoop
            | Self::StopToastLoop => Target::Hygiene,
            Self::ApplySettings { .. } | Self::ResetWidgets | Self::GetState => {
                Target::Controller
            }
        }
    }
}

/// The controller's answer to a [`Command`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum CommandReply {
    /// The command was carried out.
    Ok,
    /// The addressed widget is not attached on this surface.
    Ignored,
    NextCall { outcome: NextCallOutcome },
    State { state: StateReport },
}

/// Snapshot of everything the controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateReport {
    pub surface: Surface,
    pub automation: AutomationReport,
    pub hygiene: HygieneReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationReport {
    pub delay: u32,
    pub volume: Volume,
    pub loop_state: LoopState,
    pub loop_running: bool,
    pub countdown_remaining: Option<u32>,
    pub busy: bool,
    pub ready_for_next: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HygieneReport {
    pub tab_loop: bool,
    pub toast_loop: bool,
    pub tab_limit: u32,
}
