use crate::config::HealthConfig;
use crate::storage::UserStore;
use opentelemetry::{KeyValue, global, metrics::Gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Clone, Debug)]
pub struct Metrics {
    pub status: Gauge<i64>,
}

impl Metrics {
    #[must_use]
    pub(crate) fn new() -> Self {
        let meter = global::meter("userbase-server");
        Self {
            status: meter
                .i64_gauge("userbase_health_status")
                .with_description("Status of health checks (1 for ok, 0 for error)")
                .build(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct HealthService {
    store: Arc<dyn UserStore>,
    config: HealthConfig,
    metrics: Metrics,
}

impl HealthService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, config: HealthConfig) -> Self {
        Self { store, config, metrics: Metrics::new() }
    }

    /// Checks database connectivity.
    ///
    /// # Errors
    /// Returns a string describing the failure if the database is unreachable.
    pub async fn check_db(&self) -> Result<(), String> {
        let db_timeout = Duration::from_millis(self.config.db_timeout_ms);

        match timeout(db_timeout, self.store.ping()).await {
            Ok(Ok(())) => {
                self.metrics.status.record(1, &[KeyValue::new("component", "database")]);
                Ok(())
            }
            Ok(Err(e)) => {
                self.metrics.status.record(0, &[KeyValue::new("component", "database")]);
                Err(format!("Database connection failed: {e:?}"))
            }
            Err(_) => {
                self.metrics.status.record(0, &[KeyValue::new("component", "database")]);
                Err("Database connection timed out".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{NewUser, User};
    use crate::error::{AppError, Result};
    use crate::storage::memory::InMemoryUserRepository;
    use async_trait::async_trait;
    use uuid::Uuid;

    #[derive(Debug)]
    struct DownStore;

    #[async_trait]
    impl UserStore for DownStore {
        async fn list(&self) -> Result<Vec<User>> {
            Err(AppError::Internal)
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>> {
            Err(AppError::Internal)
        }
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>> {
            Err(AppError::Internal)
        }
        async fn find_by_token_hash(&self, _token_hash: &str) -> Result<Option<User>> {
            Err(AppError::Internal)
        }
        async fn insert(&self, _user: NewUser) -> Result<User> {
            Err(AppError::Internal)
        }
        async fn ping(&self) -> Result<()> {
            Err(AppError::Internal)
        }
    }

    #[tokio::test]
    async fn test_check_db() {
        let config = HealthConfig { db_timeout_ms: 100 };
        let healthy = HealthService::new(Arc::new(InMemoryUserRepository::new()), config.clone());
        let down = HealthService::new(Arc::new(DownStore), config);

        assert!(healthy.check_db().await.is_ok());
        assert!(down.check_db().await.unwrap_err().contains("Database connection failed"));
    }
}
