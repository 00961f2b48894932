//! In-process `CalculationStore` backed by hash maps.
//!
//! Data lives only as long as the process. Writers are serialized by a
//! single `RwLock`, so every method is atomic with respect to the others.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use abacus_core::CalculationRecord;

use crate::error::StorageError;
use crate::record::UserRecord;
use crate::traits::CalculationStore;

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, UserRecord>,
    calculations: HashMap<Uuid, CalculationRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CalculationStore for MemoryStore {
    async fn insert_user(&self, user: UserRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let taken = inner
            .users
            .values()
            .any(|u| u.username == user.username || u.email.eq_ignore_ascii_case(&user.email));
        if taken || inner.users.contains_key(&user.id) {
            return Err(StorageError::UserExists);
        }
        inner.users.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<UserRecord, StorageError> {
        let inner = self.inner.read().await;
        inner
            .users
            .get(&id)
            .cloned()
            .ok_or(StorageError::UserNotFound { id })
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == login || u.email.eq_ignore_ascii_case(login))
            .cloned())
    }

    async fn record_login(&self, id: Uuid, at: OffsetDateTime) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or(StorageError::UserNotFound { id })?;
        user.last_login = Some(at);
        Ok(())
    }

    async fn insert_calculation(&self, record: CalculationRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if inner.calculations.contains_key(&record.id()) {
            return Err(StorageError::CalculationExists { id: record.id() });
        }
        inner.calculations.insert(record.id(), record);
        Ok(())
    }

    async fn get_calculation(
        &self,
        owner: Uuid,
        id: Uuid,
    ) -> Result<CalculationRecord, StorageError> {
        let inner = self.inner.read().await;
        inner
            .calculations
            .get(&id)
            .filter(|r| r.owner() == owner)
            .cloned()
            .ok_or(StorageError::CalculationNotFound { id })
    }

    async fn list_calculations(&self, owner: Uuid) -> Result<Vec<CalculationRecord>, StorageError> {
        let inner = self.inner.read().await;
        let mut records: Vec<CalculationRecord> = inner
            .calculations
            .values()
            .filter(|r| r.owner() == owner)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(records)
    }

    async fn update_calculation(&self, record: CalculationRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let id = record.id();
        let existing = inner
            .calculations
            .get_mut(&id)
            .filter(|r| r.owner() == record.owner())
            .ok_or(StorageError::CalculationNotFound { id })?;
        if existing.operation() != record.operation() {
            return Err(StorageError::ImmutableField {
                id,
                field: "operation",
            });
        }
        if existing.created_at() != record.created_at() {
            return Err(StorageError::ImmutableField {
                id,
                field: "created_at",
            });
        }
        *existing = record;
        Ok(())
    }

    async fn delete_calculation(&self, owner: Uuid, id: Uuid) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        match inner.calculations.get(&id) {
            Some(r) if r.owner() == owner => {
                inner.calculations.remove(&id);
                Ok(())
            }
            _ => Err(StorageError::CalculationNotFound { id }),
        }
    }
}
