use crate::domain::user::{NewUser, TAKEN, User, ValidationErrors};
use crate::error::{AppError, Result};
use crate::storage::records::UserRecord;
use crate::storage::{DbPool, UserStore};
use async_trait::async_trait;
use uuid::Uuid;

const EMAIL_CONSTRAINT: &str = "users_email_lower_key";
const TOKEN_CONSTRAINT: &str = "users_token_hash_key";

#[derive(Clone, Debug)]
pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn list(&self) -> Result<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            r"
            SELECT id, name, email, password_hash, token_hash, created_at
            FROM users
            ORDER BY created_at ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r"
            SELECT id, name, email, password_hash, token_hash, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r"
            SELECT id, name, email, password_hash, token_hash, created_at
            FROM users
            WHERE lower(email) = lower($1)
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Into::into))
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r"
            SELECT id, name, email, password_hash, token_hash, created_at
            FROM users
            WHERE token_hash = $1
            ",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Into::into))
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            r"
            INSERT INTO users (id, name, email, password_hash, token_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, token_hash, created_at
            ",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.token_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(record.into())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Concurrent inserts can race past the service's pre-checks; the unique indexes settle it.
fn map_unique_violation(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
    {
        match db_err.constraint() {
            Some(EMAIL_CONSTRAINT) => return AppError::Validation(ValidationErrors::single("email", TAKEN)),
            Some(TOKEN_CONSTRAINT) => return AppError::Validation(ValidationErrors::single("token", TAKEN)),
            _ => {}
        }
    }
    AppError::Database(err)
}
