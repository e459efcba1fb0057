//! Profile cache operations.
//!
//! Profiles are cached per repository: the lookup key is the
//! `(repository, username)` pair, so the same username collected from two
//! repositories is stored twice and the partitions stay independent.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, sea_query::OnConflict,
};
use thiserror::Error;

use crate::entity::prelude::{UserProfileColumn, UserProfileEntity};
use crate::profile::UserProfile;

/// Errors that can occur during profile cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Storage backing for resolved profiles.
///
/// The resolver only needs point lookups and upserts; bulk operations
/// live on [`DbProfileStore`] directly.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Look up a cached profile.
    async fn get(&self, repository: &str, username: &str) -> Result<Option<UserProfile>>;

    /// Store a profile, replacing any existing row for the same
    /// `(repository, username)` pair.
    async fn put(&self, repository: &str, profile: &UserProfile) -> Result<()>;
}

/// Profile cache backed by the database.
#[derive(Clone)]
pub struct DbProfileStore {
    db: DatabaseConnection,
}

impl DbProfileStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Load every cached profile for one repository.
    pub async fn load_repository(&self, repository: &str) -> Result<Vec<UserProfile>> {
        let models = UserProfileEntity::find()
            .filter(UserProfileColumn::Repository.eq(repository))
            .all(&self.db)
            .await?;

        Ok(models.iter().map(UserProfile::from_model).collect())
    }

    /// Delete every cached profile for one repository. Returns the
    /// number of rows removed.
    pub async fn delete_repository(&self, repository: &str) -> Result<u64> {
        let result = UserProfileEntity::delete_many()
            .filter(UserProfileColumn::Repository.eq(repository))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl ProfileStore for DbProfileStore {
    async fn get(&self, repository: &str, username: &str) -> Result<Option<UserProfile>> {
        let model = UserProfileEntity::find()
            .filter(UserProfileColumn::Repository.eq(repository))
            .filter(UserProfileColumn::Username.eq(username))
            .one(&self.db)
            .await?;

        Ok(model.as_ref().map(UserProfile::from_model))
    }

    async fn put(&self, repository: &str, profile: &UserProfile) -> Result<()> {
        let model = profile.to_active_model(repository);

        UserProfileEntity::insert(model)
            .on_conflict(
                OnConflict::columns([UserProfileColumn::Repository, UserProfileColumn::Username])
                    .update_columns([
                        UserProfileColumn::Name,
                        UserProfileColumn::Email,
                        UserProfileColumn::Website,
                        UserProfileColumn::Organization,
                        UserProfileColumn::Location,
                        UserProfileColumn::CachedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }
}

/// In-memory profile store. Used when persistence is disabled and in
/// tests.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    entries: Mutex<HashMap<(String, String), UserProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached profiles.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, repository: &str, username: &str) -> Result<Option<UserProfile>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries
            .get(&(repository.to_string(), username.to_string()))
            .cloned())
    }

    async fn put(&self, repository: &str, profile: &UserProfile) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            (repository.to_string(), profile.username.clone()),
            profile.clone(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_and_migrate;

    async fn store() -> DbProfileStore {
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("in-memory migrate");
        DbProfileStore::new(db)
    }

    fn profile(username: &str, email: Option<&str>) -> UserProfile {
        let mut profile = UserProfile::bare(username);
        profile.email = email.map(String::from);
        profile
    }

    #[tokio::test]
    async fn round_trips_a_profile() {
        let store = store().await;
        let alice = profile("alice", Some("alice@example.com"));

        store.put("owner/repo", &alice).await.unwrap();

        let cached = store.get("owner/repo", "alice").await.unwrap();
        assert_eq!(cached, Some(alice));
    }

    #[tokio::test]
    async fn missing_profile_is_none() {
        let store = store().await;
        assert!(store.get("owner/repo", "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_is_last_write_wins() {
        let store = store().await;

        store
            .put("owner/repo", &profile("alice", None))
            .await
            .unwrap();
        store
            .put("owner/repo", &profile("alice", Some("alice@new.example")))
            .await
            .unwrap();

        let cached = store.get("owner/repo", "alice").await.unwrap().unwrap();
        assert_eq!(cached.email.as_deref(), Some("alice@new.example"));

        let all = store.load_repository("owner/repo").await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn repositories_partition_the_cache() {
        let store = store().await;

        store
            .put("a/one", &profile("alice", Some("old@example.com")))
            .await
            .unwrap();
        store
            .put("b/two", &profile("alice", Some("new@example.com")))
            .await
            .unwrap();

        let from_a = store.get("a/one", "alice").await.unwrap().unwrap();
        assert_eq!(from_a.email.as_deref(), Some("old@example.com"));

        let removed = store.delete_repository("a/one").await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("a/one", "alice").await.unwrap().is_none());
        assert!(store.get("b/two", "alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryProfileStore::new();
        assert!(store.is_empty());

        store
            .put("owner/repo", &profile("bob", None))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);

        let cached = store.get("owner/repo", "bob").await.unwrap().unwrap();
        assert_eq!(cached.username, "bob");
        assert!(store.get("other/repo", "bob").await.unwrap().is_none());
    }
}
