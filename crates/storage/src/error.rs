use uuid::Uuid;

/// All errors that can be returned by a CalculationStore implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No calculation with this id belongs to the requesting owner.
    /// Records owned by someone else are reported the same way.
    #[error("calculation not found: {id}")]
    CalculationNotFound { id: Uuid },

    /// A calculation with this id is already stored.
    #[error("calculation already exists: {id}")]
    CalculationExists { id: Uuid },

    /// An update tried to change a field that is fixed at creation
    /// (owner, operation or creation time).
    #[error("calculation {id}: {field} cannot be changed after creation")]
    ImmutableField { id: Uuid, field: &'static str },

    #[error("user not found: {id}")]
    UserNotFound { id: Uuid },

    /// Username or email already registered.
    #[error("Username or email already exists")]
    UserExists,

    /// A backend-specific storage error (connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
