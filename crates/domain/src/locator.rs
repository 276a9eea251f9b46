//! Fixed page locators and the outcome of acting on them.
//!
//! Every locator below is owned by the external console application. They
//! form a versioned external contract: when the console's markup changes,
//! this file is the one to update.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// A CSS selector addressing one element of the external page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(Cow<'static, str>);

impl Locator {
    /// Wrap a selector known at compile time.
    #[must_use]
    pub const fn fixed(selector: &'static str) -> Self {
        Self(Cow::Borrowed(selector))
    }

    /// The disposition option label for a disposition id.
    #[must_use]
    pub fn disposition(option_id: u32) -> Self {
        Self(Cow::Owned(format!("label[for=\"disp_id_{option_id}\"]")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Softphone: call state label (`": Live Call"`).
pub const CALL_STATE: Locator =
    Locator::fixed("#sfli-call-header .f9-nowrap-ellipsis span:nth-child(2)");
/// Softphone: call type label (`"Inbound Call"`).
pub const CALL_TYPE: Locator =
    Locator::fixed("#sfli-call-header .f9-nowrap-ellipsis span:first-child");
/// Softphone: dial stopwatch.
pub const DIAL_TIMER: Locator = Locator::fixed("#time-counter .stopwatch-partial");

/// Softphone: end the current interaction.
pub const END_INTERACTION: Locator = Locator::fixed("#call_endInteractionBtn");
/// Softphone: submit the selected disposition.
pub const SUBMIT_DISPOSITION: Locator = Locator::fixed("#setDisposition_call");
/// Softphone: dismiss the recurring preview/renew prompt.
pub const CANCEL_PREVIEW_RENEW: Locator = Locator::fixed("#sfli-cancel-preview-renew");

/// CRM: close affordance of every open console tab, in tab order.
pub const CONSOLE_TABS: Locator =
    Locator::fixed("ul.tabBarItems li.oneConsoleTabItem div.close");
/// CRM: the button inside a tab's close affordance.
pub const TAB_CLOSE_BUTTON: Locator = Locator::fixed(".slds-button_icon-x-small");
/// CRM: close button of every visible toast.
pub const TOAST_CLOSE: Locator = Locator::fixed(".slds-notify__close .toastClose");

/// Result of asking the click simulator to activate a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickOutcome {
    /// The element was found, enabled, and the event sequence dispatched.
    Clicked,
    /// Nothing matched the locator.
    NotFound,
    /// The element exists but is disabled or `aria-disabled`.
    Disabled,
}

impl ClickOutcome {
    #[must_use]
    pub fn is_clicked(self) -> bool {
        matches!(self, Self::Clicked)
    }
}
