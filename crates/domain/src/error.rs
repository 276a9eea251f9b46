//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`FlowMateError`] via `#[from]` (or an explicit `From` impl for adapter
//! errors that must be boxed).

/// Top-level error shared by every port boundary.
#[derive(Debug, thiserror::Error)]
pub enum FlowMateError {
    /// A value pushed from the outside violates a domain invariant.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The external console page could not be read or acted upon.
    #[error("console error: {0}")]
    Console(#[from] ConsoleError),

    /// The settings store failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Invariant violations detected by the domain.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A numeric setting was `NaN` or infinite.
    #[error("{field} must be a finite number")]
    NotFinite {
        /// Name of the offending setting.
        field: &'static str,
    },

    /// A timer period was configured as zero.
    #[error("{name} interval must be non-zero")]
    ZeroInterval {
        /// Name of the offending timer.
        name: &'static str,
    },
}

/// Failures at the page boundary (reading call status, dispatching clicks).
///
/// A missing or disabled target is **not** an error; it is reported as a
/// [`ClickOutcome`](crate::locator::ClickOutcome). These variants cover the
/// page itself misbehaving.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The frame hosting the surface is gone (navigated away, closed).
    #[error("{surface} surface is not attached")]
    Detached {
        /// Which surface was expected.
        surface: &'static str,
    },

    /// Dispatching the synthetic event sequence raised inside the page.
    #[error("click dispatch on `{locator}` failed: {reason}")]
    Dispatch {
        /// Locator that was targeted.
        locator: String,
        /// Page-side failure description.
        reason: String,
    },
}
