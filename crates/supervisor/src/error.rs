use ladder_core::ConfigError;
use thiserror::Error;

/// Errors surfaced by the supervisor's operator contract
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("a strategy run is already active")]
    AlreadyRunning,

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}
