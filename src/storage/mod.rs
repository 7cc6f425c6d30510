use crate::domain::user::{NewUser, User};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::fmt::Debug;
use uuid::Uuid;

pub mod memory;
pub mod records;
pub mod user_repo;

pub type DbPool = Pool<Postgres>;

/// Initializes the database connection pool.
///
/// # Errors
/// Returns `sqlx::Error` if the connection fails.
pub async fn init_pool(database_url: &str, max_connections: u32) -> std::result::Result<DbPool, sqlx::Error> {
    PgPoolOptions::new().max_connections(max_connections).connect(database_url).await
}

/// Persistence for users.
///
/// `insert` is the only writer and must reject a duplicate email (case-insensitive)
/// or token hash with `AppError::Validation` naming the field.
#[async_trait]
pub trait UserStore: Send + Sync + Debug {
    /// All users, oldest first.
    async fn list(&self) -> Result<Vec<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>>;

    async fn insert(&self, user: NewUser) -> Result<User>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<()>;
}
