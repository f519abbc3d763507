/// Postgres-backed repositories
///
/// Schema lives in `migrations/`. Every method is a single keyed statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccountRepository, ChirpRepository, RefreshTokenRepository, StorageError};
use crate::models::{Account, Chirp, NewAccount, NewChirp, RefreshToken, SortOrder};

#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgStorage {
    async fn create_account(&self, account: NewAccount) -> Result<Account, StorageError> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO users (id, created_at, updated_at, email, hashed_password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at, updated_at, email, hashed_password, is_chirpy_red
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(now)
        .bind(now)
        .bind(&account.email)
        .bind(&account.hashed_password)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Account, StorageError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, created_at, updated_at, email, hashed_password, is_chirpy_red
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    async fn get_account_by_id(&self, id: Uuid) -> Result<Account, StorageError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, created_at, updated_at, email, hashed_password, is_chirpy_red
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    async fn update_account_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Account, StorageError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE users
            SET email = $2, hashed_password = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, created_at, updated_at, email, hashed_password, is_chirpy_red
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(hashed_password)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    async fn upgrade_account(&self, id: Uuid) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_chirpy_red = true, updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_all_accounts(&self) -> Result<(), StorageError> {
        // refresh_tokens and chirps cascade
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for PgStorage {
    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id)
        .bind(token.created_at)
        .bind(token.updated_at)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<RefreshToken, StorageError> {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1, updated_at = $1
            WHERE token = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(revoked_at)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl ChirpRepository for PgStorage {
    async fn create_chirp(&self, chirp: NewChirp) -> Result<Chirp, StorageError> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, Chirp>(
            r#"
            INSERT INTO chirps (id, created_at, updated_at, body, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at, updated_at, body, user_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(now)
        .bind(now)
        .bind(&chirp.body)
        .bind(chirp.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list_chirps(
        &self,
        author: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<Chirp>, StorageError> {
        let query = match order {
            SortOrder::Ascending => {
                r#"
                SELECT id, created_at, updated_at, body, user_id
                FROM chirps
                WHERE $1::uuid IS NULL OR user_id = $1
                ORDER BY created_at ASC
                "#
            }
            SortOrder::Descending => {
                r#"
                SELECT id, created_at, updated_at, body, user_id
                FROM chirps
                WHERE $1::uuid IS NULL OR user_id = $1
                ORDER BY created_at DESC
                "#
            }
        };

        let chirps = sqlx::query_as::<_, Chirp>(query)
            .bind(author)
            .fetch_all(&self.pool)
            .await?;

        Ok(chirps)
    }

    async fn get_chirp(&self, id: Uuid) -> Result<Chirp, StorageError> {
        let chirp = sqlx::query_as::<_, Chirp>(
            r#"
            SELECT id, created_at, updated_at, body, user_id
            FROM chirps
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(chirp)
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM chirps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
