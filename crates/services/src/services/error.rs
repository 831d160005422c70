use thiserror::Error;
use tracing::error;

/// Discriminated failure of a role-gated action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// First input validation message.
    #[error("{0}")]
    Validation(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(&'static str),
    /// A status precondition did not hold.
    #[error("{0}")]
    InvalidState(String),
    /// Unique-constraint violation.
    #[error("{0}")]
    Conflict(String),
    /// Backing-store failure. Only `context` is shown to callers.
    #[error("{context}")]
    Store {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("{0}")]
    Storage(String),
}

impl ActionError {
    pub fn validation(message: impl Into<String>) -> Self {
        ActionError::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        ActionError::InvalidState(message.into())
    }
}

/// Replace a backing-store error with a per-action message, logging the cause.
pub trait StoreContext<T> {
    fn store(self, context: &'static str) -> Result<T, ActionError>;

    /// Like `store`, but unique violations become `Conflict(conflict)`.
    fn store_or_conflict(self, context: &'static str, conflict: &str) -> Result<T, ActionError>;
}

impl<T> StoreContext<T> for Result<T, sqlx::Error> {
    fn store(self, context: &'static str) -> Result<T, ActionError> {
        self.map_err(|source| {
            error!(error = %source, context, "Backing store failure");
            ActionError::Store { context, source }
        })
    }

    fn store_or_conflict(self, context: &'static str, conflict: &str) -> Result<T, ActionError> {
        match self {
            Err(err) if db::is_unique_violation(&err) => {
                Err(ActionError::Conflict(conflict.to_string()))
            }
            other => other.store(context),
        }
    }
}

/// Turn a missing row into `NotFound(entity)`.
pub trait Found<T> {
    fn found(self, entity: &'static str) -> Result<T, ActionError>;
}

impl<T> Found<T> for Option<T> {
    fn found(self, entity: &'static str) -> Result<T, ActionError> {
        self.ok_or(ActionError::NotFound(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_hide_the_cause() {
        let result: Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err = result.store("Failed to update building").unwrap_err();
        assert_eq!(err.to_string(), "Failed to update building");
    }

    #[test]
    fn missing_rows_name_the_entity() {
        let err = None::<()>.found("Room").unwrap_err();
        assert_eq!(err.to_string(), "Room not found");
    }
}
