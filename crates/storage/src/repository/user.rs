use sqlx::PgConnection;

use crate::dto::user::{Profile, parse_profile};
use crate::error::{Result, StorageError};
use crate::models::User;

/// Repository for User database operations
pub struct UserRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> UserRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Find a user by the platform's external id
    pub async fn find_by_vk_id(&mut self, vk_user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, vk_user_id, first_name, last_name, avatar_url, created_at
            FROM users
            WHERE vk_user_id = $1
            "#,
        )
        .bind(vk_user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(user)
    }

    /// Create a user for a previously unseen external id
    pub async fn create(&mut self, vk_user_id: i64, profile: &Profile) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (vk_user_id, first_name, last_name, avatar_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, vk_user_id, first_name, last_name, avatar_url, created_at
            "#,
        )
        .bind(vk_user_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.avatar_url)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| {
            let error = StorageError::from(e);
            // Two first requests for the same id raced each other
            if error.is_unique_violation() {
                return StorageError::ConstraintViolation(format!(
                    "User {vk_user_id} already exists"
                ));
            }
            error
        })?;

        Ok(user)
    }

    /// Return the internal id for `vk_user_id`, creating the user on first sight.
    ///
    /// The profile payload is only parsed when a user has to be created.
    pub async fn resolve(&mut self, vk_user_id: i64, profile_payload: Option<&str>) -> Result<i64> {
        if let Some(user) = self.find_by_vk_id(vk_user_id).await? {
            return Ok(user.id);
        }

        let profile = parse_profile(profile_payload);
        let user = self.create(vk_user_id, &profile).await?;
        tracing::info!(vk_user_id, user_id = user.id, "Created user");

        Ok(user.id)
    }
}
