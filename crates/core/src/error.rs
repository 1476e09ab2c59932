//! Error taxonomy for the encounter workflow.
//!
//! Four categories matter to callers: bad requests, missing references,
//! retryable infrastructure failures and everything else. The transaction
//! boundary retries only `Transient`; the other categories abort the
//! transaction immediately because re-running them cannot change the outcome.

use opd_types::{AmountError, IdError, TextError};

#[derive(Debug, thiserror::Error)]
pub enum OpdError {
    /// Malformed or missing request fields, or a domain rule violated by the
    /// request (e.g. completing a visit that never recorded a chief
    /// complaint).
    #[error("invalid request: {0}")]
    Validation(String),

    /// A referenced entity does not exist in the store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A store-reported transient failure (connection drop, deadlock
    /// victim). Safe to retry by re-running the whole workflow body.
    #[error("transient storage failure: {0}")]
    Transient(String),

    /// Anything else. Surfaced to callers without internal detail.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl OpdError {
    /// Builds a `NotFound` for the given entity kind and identifier.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        OpdError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True if the transaction boundary may retry the operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, OpdError::Transient(_))
    }
}

impl From<TextError> for OpdError {
    fn from(err: TextError) -> Self {
        OpdError::Validation(err.to_string())
    }
}

impl From<IdError> for OpdError {
    fn from(err: IdError) -> Self {
        OpdError::Validation(err.to_string())
    }
}

impl From<AmountError> for OpdError {
    fn from(err: AmountError) -> Self {
        OpdError::Validation(err.to_string())
    }
}

pub type OpdResult<T> = std::result::Result<T, OpdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(OpdError::Transient("deadlock victim".into()).is_transient());
        assert!(!OpdError::Validation("bad".into()).is_transient());
        assert!(!OpdError::not_found("patient", "abc").is_transient());
        assert!(!OpdError::Unexpected("boom".into()).is_transient());
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = OpdError::not_found("doctor", "123");
        assert_eq!(err.to_string(), "doctor not found: 123");
    }
}
