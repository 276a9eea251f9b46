//! # flowmate-domain
//!
//! Pure domain model for the flowmate call-automation controller.
//!
//! ## Responsibilities
//! - Foundational types: run identifiers, error conventions, timestamps
//! - Parse the softphone's call-status header into a **call snapshot**
//! - Decide when a countdown may start (**trigger policy**)
//! - Drive the polling/countdown **automaton** as a pure state machine
//! - Describe the **next-call plan** and its page locators
//! - Hold operator **settings**, the **command** protocol and **events**
//! - Console **hygiene** rules and **surface** detection
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automaton;
pub mod call;
pub mod command;
pub mod config;
pub mod cue;
pub mod event;
pub mod hygiene;
pub mod locator;
pub mod next_call;
pub mod retry;
pub mod settings;
pub mod surface;
pub mod trigger;
