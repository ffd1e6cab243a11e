//! Marketplace service errors.

use thiserror::Error;

use localmart_core::StatusError;

use crate::db::RepositoryError;

/// Errors raised by the catalog, order, reward and feedback services.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Caller is authenticated but does not own the resource or has the wrong role.
    #[error("{0}")]
    Forbidden(String),

    /// Malformed or out-of-range input.
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    InsufficientStock(String),

    #[error("insufficient points: {required} required, {available} available")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("reward has already been claimed")]
    AlreadyClaimed,

    /// Uniqueness violation (second shop, duplicate feedback).
    #[error("{0}")]
    Conflict(String),

    /// The entity is not in a state that allows the operation.
    #[error("{0}")]
    InvalidState(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<StatusError> for MarketError {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::Unknown(_) => Self::InvalidRequest(err.to_string()),
            StatusError::IllegalTransition { .. } => Self::InvalidState(err.to_string()),
        }
    }
}

/// Map a repository `Conflict` to a market `Conflict`, keeping its message.
pub(crate) fn conflict_or_repository(err: RepositoryError) -> MarketError {
    match err {
        RepositoryError::Conflict(message) => MarketError::Conflict(message),
        other => MarketError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use localmart_core::OrderStatus;

    use super::*;

    #[test]
    fn test_status_errors_map_to_taxonomy() {
        let unknown: MarketError = "shipped".parse::<OrderStatus>().unwrap_err().into();
        assert!(matches!(unknown, MarketError::InvalidRequest(_)));

        let backward: MarketError = OrderStatus::Completed
            .check_transition(OrderStatus::Pending)
            .unwrap_err()
            .into();
        assert!(matches!(backward, MarketError::InvalidState(_)));
    }

    #[test]
    fn test_conflict_keeps_message() {
        let err = conflict_or_repository(RepositoryError::Conflict("dup".to_owned()));
        assert!(matches!(err, MarketError::Conflict(ref m) if m == "dup"));
        let err = conflict_or_repository(RepositoryError::NotFound);
        assert!(matches!(err, MarketError::Repository(RepositoryError::NotFound)));
    }
}
