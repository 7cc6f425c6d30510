use crate::domain::auth::{AccessToken, Password};
use crate::domain::user::User;
use crate::error::{AppError, Result};
use crate::storage::UserStore;
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Metrics {
    auth_failures_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("userbase-server");
        Self {
            auth_failures_total: meter
                .u64_counter("auth_failures_total")
                .with_description("Total number of rejected bearer tokens")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    metrics: Metrics,
}

impl AuthService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store, metrics: Metrics::new() }
    }

    /// Resolves a bearer token to the user that owns it.
    ///
    /// # Errors
    /// Returns `AppError::AuthError` when no user holds the token.
    #[tracing::instrument(skip(self, token), fields(user_id = tracing::field::Empty), err(level = "debug"))]
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        if token.is_empty() {
            self.metrics.auth_failures_total.add(1, &[]);
            return Err(AppError::AuthError);
        }

        let token_hash = AccessToken::hash(token);
        if let Some(user) = self.store.find_by_token_hash(&token_hash).await? {
            tracing::Span::current().record("user_id", tracing::field::display(user.id));
            Ok(user)
        } else {
            self.metrics.auth_failures_total.add(1, &[]);
            Err(AppError::AuthError)
        }
    }

    /// Argon2 is deliberately slow, so it runs off the async workers.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if hashing fails or the blocking task panics.
    #[tracing::instrument(err, skip(self, password))]
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || Password::hash(&password)).await.map_err(|_| AppError::Internal)?
    }
}
