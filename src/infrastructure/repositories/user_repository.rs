//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait.
//! Maps between the database schema and domain User entity.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::map_write_error;
use crate::domain::{User, UserDetails, UserId, UserRepository, UserSettings};
use crate::shared::error::AppError;

/// Database row representation of the users table.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    fullname: String,
    extension: Option<String>,
    enabled: bool,
    settings: Json<UserSettings>,
}

impl UserRow {
    /// Convert database row to domain User entity.
    fn into_user(self) -> User {
        User {
            id: UserId::from_uuid(self.id),
            details: UserDetails {
                username: self.username,
                fullname: self.fullname,
                extension: self.extension,
                enabled: self.enabled,
            },
            settings: self.settings.0,
        }
    }
}

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_USER: &str = r#"
    SELECT id, username, fullname, extension, enabled, settings
    FROM users
"#;

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_all(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} ORDER BY username"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn insert(&self, user: &User) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, fullname, extension, enabled, settings)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, fullname, extension, enabled, settings
            "#,
        )
        .bind(user.id.0)
        .bind(&user.details.username)
        .bind(&user.details.fullname)
        .bind(&user.details.extension)
        .bind(user.details.enabled)
        .bind(Json(&user.settings))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "user"))?;

        Ok(row.into_user())
    }

    async fn save(&self, user: &User) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET username = $2, fullname = $3, extension = $4, enabled = $5, settings = $6
            WHERE id = $1
            RETURNING id, username, fullname, extension, enabled, settings
            "#,
        )
        .bind(user.id.0)
        .bind(&user.details.username)
        .bind(&user.details.fullname)
        .bind(&user.details.extension)
        .bind(user.details.enabled)
        .bind(Json(&user.settings))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "user"))?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))?;

        Ok(row.into_user())
    }
}
