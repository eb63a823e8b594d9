//! Service errors

use crate::config::ConfigError;
use crate::source::SourceError;
use thiserror::Error;

/// Errors surfaced by [`super::RadarService`]
#[derive(Debug, Error)]
pub enum RadarError {
    /// Configuration rejected; the loop was not started
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Radar is already running")]
    AlreadyRunning,
    #[error("Radar is not running")]
    NotRunning,
    /// No universe could be fetched and none was cached
    #[error("Data unavailable: {0}")]
    DataUnavailable(#[from] SourceError),
}
