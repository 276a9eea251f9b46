//! Console ports: reading the softphone header and acting on the page.
//!
//! Selector semantics are owned by the external application; adapters
//! receive a [`Locator`] and decide how to resolve it.

use std::future::Future;

use flowmate_domain::call::RawCallStatus;
use flowmate_domain::error::FlowMateError;
use flowmate_domain::locator::{ClickOutcome, Locator};

/// Reads the softphone's call-status header.
pub trait CallStatusReader {
    /// Read the three header fields, trimmed. Missing elements are `None`.
    fn read_call_status(&self) -> impl Future<Output = Result<RawCallStatus, FlowMateError>> + Send;
}

/// Activates page elements the way a pointer would.
///
/// A click is the full sequence `focus`, `pointerdown`, `mousedown`,
/// `pointerup`, `mouseup`, then the native click.
pub trait ClickSimulator {
    /// Click the first element matching `target`.
    ///
    /// A missing or disabled target is reported through [`ClickOutcome`];
    /// `Err` is reserved for the page itself failing.
    fn click(
        &self,
        target: &Locator,
    ) -> impl Future<Output = Result<ClickOutcome, FlowMateError>> + Send;
}

/// The CRM console's tab strip and toast area.
pub trait ConsoleTabs {
    /// Number of open console tabs.
    fn count_tabs(&self) -> impl Future<Output = Result<usize, FlowMateError>> + Send;

    /// Close the tab at `index` (0 is the leftmost).
    fn close_tab(
        &self,
        index: usize,
    ) -> impl Future<Output = Result<ClickOutcome, FlowMateError>> + Send;

    /// Dismiss every visible toast, returning how many were closed.
    fn dismiss_toasts(&self) -> impl Future<Output = Result<usize, FlowMateError>> + Send;
}

impl<T: CallStatusReader + Send + Sync> CallStatusReader for std::sync::Arc<T> {
    fn read_call_status(&self) -> impl Future<Output = Result<RawCallStatus, FlowMateError>> + Send {
        (**self).read_call_status()
    }
}

impl<T: ClickSimulator + Send + Sync> ClickSimulator for std::sync::Arc<T> {
    fn click(
        &self,
        target: &Locator,
    ) -> impl Future<Output = Result<ClickOutcome, FlowMateError>> + Send {
        (**self).click(target)
    }
}

impl<T: ConsoleTabs + Send + Sync> ConsoleTabs for std::sync::Arc<T> {
    fn count_tabs(&self) -> impl Future<Output = Result<usize, FlowMateError>> + Send {
        (**self).count_tabs()
    }

    fn close_tab(
        &self,
        index: usize,
    ) -> impl Future<Output = Result<ClickOutcome, FlowMateError>> + Send {
        (**self).close_tab(index)
    }

    fn dismiss_toasts(&self) -> impl Future<Output = Result<usize, FlowMateError>> + Send {
        (**self).dismiss_toasts()
    }
}
