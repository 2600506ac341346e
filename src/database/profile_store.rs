use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::Profile;
use crate::config::DatabaseConfig;
use crate::types::Role;

#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("profile not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Read/update access to the `profiles` table. Creation and deletion belong
/// to the signup flow.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, ProfileStoreError>;

    /// Set `role` and `updated_at` on an existing row
    async fn update_role(
        &self,
        id: Uuid,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> Result<(), ProfileStoreError>;

    /// Cheap connectivity check for `/health`
    async fn ping(&self) -> Result<(), ProfileStoreError>;
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store over the process-wide pool from `DatabaseManager`
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, ProfileStoreError> {
        let pool = DatabaseManager::pool(config).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, ProfileStoreError> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, company_name, contact_person, phone_number, address,
                   role, created_at, updated_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn update_role(
        &self,
        id: Uuid,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> Result<(), ProfileStoreError> {
        let result = sqlx::query("UPDATE profiles SET role = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .bind(updated_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ProfileStoreError::NotFound(id));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), ProfileStoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
