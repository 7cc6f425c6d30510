use crate::config::TokenPolicy;
use crate::domain::auth::AccessToken;
use crate::domain::user::{NewUser, Registration, TAKEN, User, ValidationErrors};
use crate::error::{AppError, Result};
use crate::services::auth_service::AuthService;
use crate::storage::UserStore;
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Metrics {
    users_registered_total: Counter<u64>,
    users_registration_rejected_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("userbase-server");
        Self {
            users_registered_total: meter
                .u64_counter("users_registered_total")
                .with_description("Total number of successful user registrations")
                .build(),
            users_registration_rejected_total: meter
                .u64_counter("users_registration_rejected_total")
                .with_description("Total number of registrations rejected by validation")
                .build(),
        }
    }
}

/// A freshly persisted user together with the plaintext token issued to it.
#[derive(Debug, Clone)]
pub struct CreatedUser {
    pub user: User,
    pub token: String,
}

#[derive(Clone, Debug)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    auth_service: AuthService,
    token_policy: TokenPolicy,
    metrics: Metrics,
}

impl UserService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, auth_service: AuthService, token_policy: TokenPolicy) -> Self {
        Self { store, auth_service, token_policy, metrics: Metrics::new() }
    }

    /// # Errors
    /// Propagates storage failures.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn list(&self) -> Result<Vec<User>> {
        self.store.list().await
    }

    /// # Errors
    /// Returns `AppError::NotFound` if no user has this id.
    #[tracing::instrument(skip(self), fields(user.id = %id), err(level = "debug"))]
    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.store.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// Validates, hashes and stores a new user.
    ///
    /// # Errors
    /// Returns `AppError::Validation` when a field rule or a uniqueness rule fails.
    #[tracing::instrument(skip(self, registration), fields(user.id = tracing::field::Empty), err(level = "warn"))]
    pub async fn register(&self, registration: Registration) -> Result<CreatedUser> {
        match self.try_register(registration).await {
            Err(AppError::Validation(errors)) => {
                self.metrics.users_registration_rejected_total.add(1, &[]);
                Err(AppError::Validation(errors))
            }
            other => other,
        }
    }

    async fn try_register(&self, registration: Registration) -> Result<CreatedUser> {
        let valid = registration.validate().map_err(AppError::Validation)?;

        let token = match (self.token_policy, valid.token) {
            (TokenPolicy::Client, Some(token)) => token,
            (TokenPolicy::Server, Some(_)) => {
                tracing::debug!("Ignoring client supplied token");
                AccessToken::generate()
            }
            (_, None) => AccessToken::generate(),
        };
        let token_hash = AccessToken::hash(&token);

        let mut errors = ValidationErrors::default();
        if self.store.find_by_email(&valid.email).await?.is_some() {
            errors.add("email", TAKEN);
        }
        if self.store.find_by_token_hash(&token_hash).await?.is_some() {
            errors.add("token", TAKEN);
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let password_hash = self.auth_service.hash_password(&valid.password).await?;

        let user = self
            .store
            .insert(NewUser { id: Uuid::now_v7(), name: valid.name, email: valid.email, password_hash, token_hash })
            .await?;

        tracing::Span::current().record("user.id", tracing::field::display(user.id));
        tracing::info!("User registered successfully");
        self.metrics.users_registered_total.add(1, &[]);

        Ok(CreatedUser { user, token })
    }
}
