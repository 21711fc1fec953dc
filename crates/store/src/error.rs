use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    /// A uniqueness check failed; carries the offending field name.
    #[error("duplicate value for field '{0}'")]
    Duplicate(String),

    #[error("internal store error: {0}")]
    Internal(String),
}
