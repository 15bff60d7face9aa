use thiserror::Error;

/// Errors raised by the simulation engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// The configuration or the team inputs cannot produce a valid run.
    /// Raised before any trial is played.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The caller asked the run to stop between trials.
    #[error("Simulation cancelled after {completed} trial(s)")]
    Cancelled { completed: u32 },
}
