use crate::archive::error::ArchiveError;
use crate::fetch::error::FetchError;
use crate::types::error::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaiwanWeatherError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl TaiwanWeatherError {
    /// Network failure, before any file was written.
    pub fn is_transport(&self) -> bool {
        matches!(self, TaiwanWeatherError::Fetch(e) if e.is_transport())
    }

    /// The API rejected the request (bad key, unknown dataset), before any file was written.
    pub fn is_remote_api(&self) -> bool {
        matches!(self, TaiwanWeatherError::Fetch(e) if e.is_remote_api())
    }
}
