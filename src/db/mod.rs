//! Credential store layer.
//!
//! Persistence of external-auth records belongs to the host; this crate
//! reaches it through [`CredentialStore`].

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ExternalAuthRecord;

pub use memory::InMemoryCredentialStore;

/// Per-user external-auth records, at most one per (user, provider).
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fails with `NotFound` when no record exists.
    async fn get(&self, user_uuid: &str, provider: &str) -> Result<ExternalAuthRecord>;

    /// Fails with `BadRequest` when a record already exists.
    async fn create(
        &self,
        user_uuid: &str,
        provider: &str,
        record: &ExternalAuthRecord,
    ) -> Result<()>;

    /// Fails with `NotFound` when no record exists.
    async fn update(
        &self,
        user_uuid: &str,
        provider: &str,
        record: &ExternalAuthRecord,
    ) -> Result<()>;

    /// Fails with `NotFound` when no record exists.
    async fn delete(&self, user_uuid: &str, provider: &str) -> Result<()>;
}
