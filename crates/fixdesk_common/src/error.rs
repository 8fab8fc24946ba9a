//! Error types for Fixdesk.

use thiserror::Error;

/// Errors surfaced by workflow transitions and their collaborators.
#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl DeskError {
    /// Stable numeric code for each error kind.
    pub fn code(&self) -> i32 {
        match self {
            DeskError::NotFound(_) => 404,
            DeskError::Forbidden(_) => 403,
            DeskError::InvalidArgument(_) => 400,
            DeskError::Conflict(_) => 409,
            DeskError::PreconditionFailed(_) => 412,
            DeskError::Unavailable(_) => 503,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DeskError::NotFound("c1".into()).code(), 404);
        assert_eq!(DeskError::Forbidden("nope".into()).code(), 403);
        assert_eq!(DeskError::Conflict("again".into()).code(), 409);
        assert_eq!(DeskError::Unavailable("db".into()).code(), 503);
    }

    #[test]
    fn test_error_display() {
        let err = DeskError::PreconditionFailed("work not finished".into());
        assert_eq!(err.to_string(), "Precondition failed: work not finished");
    }
}
