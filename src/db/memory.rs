// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process credential store backed by a concurrent map.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::db::CredentialStore;
use crate::error::{AppError, Result};
use crate::models::ExternalAuthRecord;

type RecordKey = (String, String);

/// Credential store kept in memory, used when the host does not provide one.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: DashMap<RecordKey, ExternalAuthRecord>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn key(user_uuid: &str, provider: &str) -> RecordKey {
    (user_uuid.to_string(), provider.to_string())
}

fn not_found(user_uuid: &str, provider: &str) -> AppError {
    AppError::NotFound(format!(
        "No {} external auth for user {}",
        provider, user_uuid
    ))
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, user_uuid: &str, provider: &str) -> Result<ExternalAuthRecord> {
        self.records
            .get(&key(user_uuid, provider))
            .map(|record| record.value().clone())
            .ok_or_else(|| not_found(user_uuid, provider))
    }

    async fn create(
        &self,
        user_uuid: &str,
        provider: &str,
        record: &ExternalAuthRecord,
    ) -> Result<()> {
        match self.records.entry(key(user_uuid, provider)) {
            Entry::Occupied(_) => Err(AppError::BadRequest(format!(
                "{} external auth already exists for user {}",
                provider, user_uuid
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn update(
        &self,
        user_uuid: &str,
        provider: &str,
        record: &ExternalAuthRecord,
    ) -> Result<()> {
        let mut existing = self
            .records
            .get_mut(&key(user_uuid, provider))
            .ok_or_else(|| not_found(user_uuid, provider))?;
        *existing = record.clone();
        Ok(())
    }

    async fn delete(&self, user_uuid: &str, provider: &str) -> Result<()> {
        self.records
            .remove(&key(user_uuid, provider))
            .map(|_| ())
            .ok_or_else(|| not_found(user_uuid, provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PROVIDER;

    #[tokio::test]
    async fn test_delete_twice_second_is_not_found() {
        let store = InMemoryCredentialStore::new();
        store
            .create("user", PROVIDER, &ExternalAuthRecord::default())
            .await
            .unwrap();

        assert!(store.delete("user", PROVIDER).await.is_ok());
        assert!(matches!(
            store.delete("user", PROVIDER).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_is_unique_per_user_and_provider() {
        let store = InMemoryCredentialStore::new();
        let record = ExternalAuthRecord::default();

        store.create("user", PROVIDER, &record).await.unwrap();
        store.create("user", "microsoft", &record).await.unwrap();
        store.create("other", PROVIDER, &record).await.unwrap();

        assert!(matches!(
            store.create("user", PROVIDER, &record).await,
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_update_requires_existing_record() {
        let store = InMemoryCredentialStore::new();

        let result = store
            .update("user", PROVIDER, &ExternalAuthRecord::default())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(store.is_empty());
    }
}
