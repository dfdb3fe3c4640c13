use thiserror::Error;

/// Errors surfaced by storefront operations.
///
/// The variants map one-to-one onto the failure classes callers need to
/// distinguish: rejected input, missing records, illegal state transitions,
/// and storage faults. Collaborator failures (history append, notification)
/// are never represented here; they are logged and swallowed by the
/// operation that triggered them.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Input rejected before any write (bad quantity, malformed phone,
    /// missing required field).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A referenced record does not exist. No mutation has happened.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The operation is not legal in the entity's current state
    /// (mutating a checked-out cart, removing a bundle line individually).
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Underlying storage failure.
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn state_conflict(message: impl Into<String>) -> Self {
        StoreError::StateConflict(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::not_found("Cart", "cart-1");
        assert_eq!(err.to_string(), "Cart not found: cart-1");

        let err = StoreError::validation("quantity must be at least 1");
        assert_eq!(
            err.to_string(),
            "Validation failed: quantity must be at least 1"
        );
    }
}
