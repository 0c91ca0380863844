//! Directory Cache
//!
//! Read-through cache of user records and the username -> id lookup, backed by
//! the user store. Writes go through the store first and only then update the
//! cache, so a failed write leaves the cache untouched.

use std::sync::Arc;

use dashmap::DashMap;

use crate::domain::{User, UserId, UserRepository};
use crate::shared::error::AppError;

pub struct UserDirectory {
    repo: Arc<dyn UserRepository>,
    by_id: DashMap<UserId, User>,
    by_username: DashMap<String, UserId>,
}

impl UserDirectory {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self {
            repo,
            by_id: DashMap::new(),
            by_username: DashMap::new(),
        }
    }

    /// User by id, loading it from the store on a miss.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, AppError> {
        if let Some(user) = self.by_id.get(&id) {
            return Ok(Some(user.value().clone()));
        }

        let loaded = self.repo.find_by_id(id).await?;
        if let Some(user) = &loaded {
            self.cache(user.clone());
        }
        Ok(loaded)
    }

    /// User by exact username, loading it from the store on a miss.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let cached_id = self.by_username.get(username).map(|id| *id.value());
        if let Some(id) = cached_id {
            return self.get(id).await;
        }

        let loaded = self.repo.find_by_username(username).await?;
        if let Some(user) = &loaded {
            self.cache(user.clone());
        }
        Ok(loaded)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.get_by_username(username).await?.is_some())
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// `Conflict` when the username is taken.
    pub async fn create(&self, user: User) -> Result<User, AppError> {
        if self.username_exists(user.username()).await? {
            return Err(AppError::Conflict(format!(
                "Username {} is already taken",
                user.username()
            )));
        }

        let stored = self.repo.insert(&user).await?;
        self.cache(stored.clone());
        tracing::info!(user_id = %stored.id, username = %stored.username(), "User created");
        Ok(stored)
    }

    /// Persist changes to an existing user and refresh the cache, re-keying
    /// the username index on rename.
    pub async fn update(&self, user: User) -> Result<User, AppError> {
        let previous_username = self
            .by_id
            .get(&user.id)
            .map(|cached| cached.details.username.clone());

        let stored = self.repo.save(&user).await?;

        if let Some(old) = previous_username {
            if old != stored.details.username {
                self.by_username.remove_if(&old, |_, id| *id == stored.id);
            }
        }
        self.cache(stored.clone());
        Ok(stored)
    }

    /// Load every stored user into the cache. Returns how many were loaded.
    pub async fn load_all(&self) -> Result<usize, AppError> {
        let users = self.repo.find_all().await?;
        let count = users.len();
        for user in users {
            self.cache(user);
        }
        tracing::info!(count, "User directory warmed");
        Ok(count)
    }

    /// Every stored user, refreshing the cache on the way.
    pub async fn all(&self) -> Result<Vec<User>, AppError> {
        let mut users = self.repo.find_all().await?;
        for user in &users {
            self.cache(user.clone());
        }
        users.sort_by(|a, b| a.details.username.cmp(&b.details.username));
        Ok(users)
    }

    pub fn cached_len(&self) -> usize {
        self.by_id.len()
    }

    pub fn clear(&self) {
        self.by_id.clear();
        self.by_username.clear();
    }

    fn cache(&self, user: User) {
        self.by_username
            .insert(user.details.username.clone(), user.id);
        self.by_id.insert(user.id, user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockUserRepository;

    #[tokio::test]
    async fn test_get_reads_through_once() {
        let user = User::new("alice", "Alice");
        let id = user.id;
        let mut repo = MockUserRepository::new();
        let stored = user.clone();
        repo.expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));
        let directory = UserDirectory::new(Arc::new(repo));

        assert_eq!(directory.get(id).await.unwrap(), Some(user.clone()));
        assert_eq!(directory.get(id).await.unwrap(), Some(user));
        assert_eq!(directory.cached_len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_username_uses_index() {
        let user = User::new("bob", "Bob");
        let mut repo = MockUserRepository::new();
        let stored = user.clone();
        repo.expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));
        let directory = UserDirectory::new(Arc::new(repo));

        assert!(directory.get_by_username("bob").await.unwrap().is_some());
        // Second lookup is served by the cache
        assert!(directory.username_exists("bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_duplicate_username_is_conflict() {
        let existing = User::new("carol", "Carol");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_insert().never();
        let directory = UserDirectory::new(Arc::new(repo));

        let result = directory.create(User::new("carol", "Other Carol")).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_cache_untouched() {
        let user = User::new("dave", "Dave");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().returning(|_| Ok(None));
        repo.expect_insert().returning(|u| Ok(u.clone()));
        repo.expect_save()
            .returning(|_| Err(AppError::Repository("write timeout".into())));
        let directory = UserDirectory::new(Arc::new(repo));
        let created = directory.create(user).await.unwrap();

        let mut renamed = created.clone();
        renamed.details.fullname = "David".into();
        let result = directory.update(renamed).await;

        assert!(matches!(result, Err(AppError::Repository(_))));
        assert_eq!(
            directory.get(created.id).await.unwrap().unwrap().details.fullname,
            "Dave"
        );
    }

    #[tokio::test]
    async fn test_rename_rekeys_username_index() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().returning(|_| Ok(None));
        repo.expect_insert().returning(|u| Ok(u.clone()));
        repo.expect_save().returning(|u| Ok(u.clone()));
        let directory = UserDirectory::new(Arc::new(repo));
        let created = directory.create(User::new("erin", "Erin")).await.unwrap();

        let mut renamed = created.clone();
        renamed.details.username = "erin2".into();
        directory.update(renamed).await.unwrap();

        assert!(directory.by_username.get("erin").is_none());
        assert_eq!(directory.by_username.get("erin2").map(|id| *id), Some(created.id));
    }
}
