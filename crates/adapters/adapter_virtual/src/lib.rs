//! # flowmate-adapter-virtual
//!
//! Simulated consoles for running the controller without a browser.
//!
//! | Type | Port(s) | Behaviour |
//! |------|---------|-----------|
//! | [`VirtualSoftphone`] | `CallStatusReader`, `ClickSimulator` | Scripted dial / live / wrap-up cycle |
//! | [`VirtualCrmConsole`] | `ConsoleTabs` | Tab strip and toasts, optionally filled over time |
//! | [`TracingCuePlayer`] | `CuePlayer` | Logs tones at `info` |
//!
//! ## Dependency rule
//!
//! Depends on `flowmate-app` (port traits) and `flowmate-domain` only.

mod crm;
mod cue;
mod softphone;

pub use crm::VirtualCrmConsole;
pub use cue::TracingCuePlayer;
pub use softphone::{SoftphoneScript, VirtualSoftphone};
