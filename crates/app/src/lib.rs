//! # flowmate-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `CallStatusReader`: read the softphone's call-status header
//!   - `ClickSimulator`: activate page elements
//!   - `ConsoleTabs`: count and close CRM tabs, dismiss toasts
//!   - `CuePlayer`: audible countdown feedback
//!   - `SettingsRepository`: persist operator settings
//!   - `EventPublisher`: publish controller events
//! - Define the **driving/inbound port** `ControlPort`, implemented by `Controller`
//! - Run the **call loop** (poll and countdown timers around the pure automaton)
//! - Run the **next-call action** under its busy / ready-for-next guard
//! - Run **console hygiene** loops
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `flowmate-domain` only (plus `tokio` for timers, tasks and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod call_loop;
pub mod controller;
pub mod event_bus;
pub mod hygiene;
pub mod next_call;
pub mod ports;
