//! Control port: the driving side, used by the HTTP adapter.

use std::future::Future;

use flowmate_domain::command::{Command, CommandReply, StateReport};
use flowmate_domain::error::FlowMateError;

/// Accepts commands from a panel and reports controller state.
pub trait ControlPort {
    /// Execute one command.
    fn execute(
        &self,
        command: Command,
    ) -> impl Future<Output = Result<CommandReply, FlowMateError>> + Send;

    /// Current state of every widget.
    fn state(&self) -> StateReport;
}

impl<T: ControlPort + Send + Sync> ControlPort for std::sync::Arc<T> {
    fn execute(
        &self,
        command: Command,
    ) -> impl Future<Output = Result<CommandReply, FlowMateError>> + Send {
        (**self).execute(command)
    }

    fn state(&self) -> StateReport {
        (**self).state()
    }
}
