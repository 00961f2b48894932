use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use abacus_core::CalculationRecord;

use crate::error::StorageError;
use crate::record::UserRecord;

/// The storage trait for Abacus backends.
///
/// A `CalculationStore` keeps user accounts and their calculation records.
/// Every calculation query is scoped by owner: a record that exists but
/// belongs to another user is indistinguishable from a missing one
/// (`StorageError::CalculationNotFound`).
///
/// The store persists records as given. It never evaluates calculations;
/// results arrive already computed by [`abacus_core::CalculationRecord`].
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` to be used in axum
/// application state and across async task boundaries. The trait is
/// object safe; the server holds it as `Arc<dyn CalculationStore>`.
#[async_trait]
pub trait CalculationStore: Send + Sync + 'static {
    // ── Users ────────────────────────────────────────────────────────────────

    /// Insert a new user.
    ///
    /// Returns `Err(StorageError::UserExists)` if the username or the email
    /// is already registered.
    async fn insert_user(&self, user: UserRecord) -> Result<(), StorageError>;

    /// Returns `Err(StorageError::UserNotFound)` if there is no such user.
    async fn get_user(&self, id: Uuid) -> Result<UserRecord, StorageError>;

    /// Look a user up by username or email. `Ok(None)` when neither matches.
    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, StorageError>;

    /// Stamp a successful login.
    async fn record_login(&self, id: Uuid, at: OffsetDateTime) -> Result<(), StorageError>;

    // ── Calculations ─────────────────────────────────────────────────────────

    /// Returns `Err(StorageError::CalculationExists)` on a duplicate id.
    async fn insert_calculation(&self, record: CalculationRecord) -> Result<(), StorageError>;

    async fn get_calculation(
        &self,
        owner: Uuid,
        id: Uuid,
    ) -> Result<CalculationRecord, StorageError>;

    /// All of `owner`'s calculations, oldest first.
    async fn list_calculations(&self, owner: Uuid) -> Result<Vec<CalculationRecord>, StorageError>;

    /// Replace a stored calculation with an updated copy.
    ///
    /// The record is matched by id and owner. Owner, operation and
    /// creation time must be unchanged, otherwise
    /// `Err(StorageError::ImmutableField)`.
    async fn update_calculation(&self, record: CalculationRecord) -> Result<(), StorageError>;

    async fn delete_calculation(&self, owner: Uuid, id: Uuid) -> Result<(), StorageError>;
}
