/// Configuration problems found while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Failure of a whole poll cycle, as seen by the scheduler loop.
///
/// Per-message forward failures and entity resolution failures never reach
/// this type; the poller logs them and carries on.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("session is not authorized, run the login tool first")]
    Unauthorized,

    #[error("failed to connect: {0:#}")]
    Connect(anyhow::Error),

    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Retry after the scheduler's retry delay.
    Recoverable,
    /// Needs the user to act; retrying soon will not help, so wait for the
    /// next scheduled run.
    Persistent,
}

impl CycleError {
    pub fn severity(&self) -> Severity {
        match self {
            CycleError::Unauthorized => Severity::Persistent,
            CycleError::Connect(_) | CycleError::Transport(_) => Severity::Recoverable,
        }
    }
}
