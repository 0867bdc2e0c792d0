//! # Error types of the cascade engine
//!
//! Every failure of the physics, the stage search, the flow solver and the
//! budget fitting is reported as one of the variants below. None of them is
//! retried internally: the caller (facility build step) treats them as fatal.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CascadeError {
    /// out-of-range assay, cut or physical constant
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// an iterative search ran out of iterations
    #[error("{procedure} did not converge after {iterations} iterations: {message}")]
    NonConvergence {
        procedure: String,
        iterations: usize,
        message: String,
    },
    /// the target enrichment cannot be reached with the available machines
    #[error("Insufficient hardware: {0}")]
    InsufficientHardware(String),
    /// the stage flow system has no unique physical solution
    #[error("Singular flow system: {0}")]
    SingularSystem(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CascadeResult<T> = Result<T, CascadeError>;

impl CascadeError {
    pub fn non_convergence(procedure: &str, iterations: usize, message: String) -> Self {
        CascadeError::NonConvergence {
            procedure: procedure.to_string(),
            iterations,
            message,
        }
    }
}
