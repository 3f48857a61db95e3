use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the hard-body engine.
///
/// Contract violations are fatal: the scheduler halts on the first one and
/// never retries or clamps. Running out of events is not an error and is
/// reported through [`crate::core::StepOutcome::NoFurtherEvents`].
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// A potential or the scheduler produced an impossible value
    /// (negative or NaN collision time, non-positive reduced mass, ...).
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// No potential registered for a pair of particle types.
    #[error("no potential registered for particle types ({0}, {1})")]
    MissingPotential(usize, usize),

    /// Operation not allowed in the current scheduler state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Numerical or geometric issue (e.g., coincident centers at contact).
    #[error("numerical error: {0}")]
    MathError(String),

    /// The neighbor catalog missed a collision that a full scan finds.
    #[error("stale neighbor catalog: {0}")]
    StaleNeighbors(String),

    /// Malformed configuration text.
    #[error(transparent)]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error is a broken invariant rather than bad input.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ContractViolation(_)
                | Error::MissingPotential(..)
                | Error::MathError(_)
                | Error::StaleNeighbors(_)
        )
    }
}
