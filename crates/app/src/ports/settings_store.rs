//! Settings storage port.

use std::future::Future;

use flowmate_domain::error::FlowMateError;
use flowmate_domain::settings::{Settings, SettingsPatch};

/// Key-value persistence for operator settings.
pub trait SettingsRepository {
    /// Load whatever is stored. Missing keys are absent from the patch.
    fn load(&self) -> impl Future<Output = Result<SettingsPatch, FlowMateError>> + Send;

    /// Persist every key of `settings`, replacing stored values.
    fn store(&self, settings: &Settings) -> impl Future<Output = Result<(), FlowMateError>> + Send;
}

impl<T: SettingsRepository + Send + Sync> SettingsRepository for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<SettingsPatch, FlowMateError>> + Send {
        (**self).load()
    }

    fn store(&self, settings: &Settings) -> impl Future<Output = Result<(), FlowMateError>> + Send {
        (**self).store(settings)
    }
}
