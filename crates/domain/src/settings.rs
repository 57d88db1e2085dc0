use crate::{Method, ReadError};

#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    async fn read_settings(&self) -> Result<Settings, ReadError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Method used to evaluate session records for personal records.
    pub session_metric: Method,
    pub activity_limit: Option<usize>,
    pub progression_limit: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_metric: Method::MaxWeight,
            activity_limit: None,
            progression_limit: None,
        }
    }
}
