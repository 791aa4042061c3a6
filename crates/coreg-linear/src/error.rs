use thiserror::Error;

/// Failure of a co-registration computation.
///
/// None of these are retried internally: the computation is deterministic, so
/// the only recovery is to collect more (or better) samples and compute again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoregistrationError {
    #[error("need at least {needed} correlations, got {got}")]
    InsufficientSamples { needed: usize, got: usize },
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
    #[error("numerical instability: {0}")]
    NumericalInstability(String),
}

pub type Result<T, E = CoregistrationError> = std::result::Result<T, E>;
