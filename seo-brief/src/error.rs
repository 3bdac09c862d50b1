//! Error taxonomy for the operation boundaries (analysis run, brief step,
//! article run).
//!
//! Adapters and the binary work with `anyhow::Result`; every failure that
//! crosses an operation boundary is folded into one [`BriefError`] carrying a
//! single human-readable message.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BriefError {
    /// Rejected before any external call (empty keyword list, bad URL, ...)
    #[error("validation failed: {0}")]
    Validation(String),

    /// A ranking, on-page or generation call failed or returned a failure value
    #[error("{service} failed: {message}")]
    ExternalService { service: String, message: String },

    /// Step number outside 1..=7. Callers treat this as a no-op.
    #[error("invalid brief step {0}")]
    State(u8),

    #[error("operation cancelled")]
    Cancelled,

    #[error("session store error: {0}")]
    Storage(String),
}

impl BriefError {
    pub fn external(service: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: format!("{:#}", err),
        }
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{:#}", err))
    }
}

pub type BriefResult<T> = Result<T, BriefError>;
