//! Next-call plan: the fixed interaction script that ends the current
//! call and readies the softphone for the next one.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::locator::{self, ClickOutcome, Locator};
use crate::retry::RetryPolicy;

/// Disposition option selected when none is configured.
pub const DEFAULT_DISPOSITION_ID: u32 = 42;

/// Retry budget for the end-interaction control.
pub const END_INTERACTION_RETRY: RetryPolicy = RetryPolicy::new(5, Duration::from_millis(250));

/// How often (and how far apart) the preview/renew prompt is dismissed.
pub const CANCEL_RENEW_REPEAT: RetryPolicy = RetryPolicy::new(15, Duration::from_millis(250));

/// The steps of the next-call sequence, in order.
///
/// 1. end the interaction (retried, best effort)
/// 2. select the disposition option
/// 3. submit the disposition
/// 4. dismiss the preview/renew prompt repeatedly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextCallPlan {
    pub end_interaction: Locator,
    pub end_interaction_retry: RetryPolicy,
    pub disposition: Locator,
    pub submit_disposition: Locator,
    pub cancel_renew: Locator,
    pub cancel_renew_repeat: RetryPolicy,
}

impl NextCallPlan {
    /// The standard plan, selecting disposition option `disposition_id`.
    #[must_use]
    pub fn with_disposition(disposition_id: u32) -> Self {
        Self {
            end_interaction: locator::END_INTERACTION,
            end_interaction_retry: END_INTERACTION_RETRY,
            disposition: Locator::disposition(disposition_id),
            submit_disposition: locator::SUBMIT_DISPOSITION,
            cancel_renew: locator::CANCEL_PREVIEW_RENEW,
            cancel_renew_repeat: CANCEL_RENEW_REPEAT,
        }
    }
}

impl Default for NextCallPlan {
    fn default() -> Self {
        Self::with_disposition(DEFAULT_DISPOSITION_ID)
    }
}

/// What each step of a completed run achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextCallReport {
    /// Whether any end-interaction attempt landed.
    pub ended_interaction: bool,
    pub disposition: ClickOutcome,
    pub submit: ClickOutcome,
    /// How many of the dismiss clicks found the prompt.
    pub renew_prompts_dismissed: u32,
}

/// How a requested next-call run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NextCallOutcome {
    /// Every step ran.
    Completed { report: NextCallReport },
    /// A step raised; the rest of the sequence was abandoned.
    Failed { error: String },
    /// Another run was already in flight.
    Skipped,
}
