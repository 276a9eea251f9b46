//! # flowmate-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Accept panel commands as JSON on `POST /api/commands`
//! - Report controller state on `GET /api/state`
//! - Relay controller events as Server-Sent Events on `GET /api/events/stream`
//! - Map [`FlowMateError`](flowmate_domain::error::FlowMateError) into HTTP
//!   status codes
//!
//! ## Dependency rule
//! Depends on `flowmate-app` (for the control port and the event bus) and
//! `flowmate-domain` (for the command protocol). Never leaks axum types into
//! the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
