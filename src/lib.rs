#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod storage;
pub mod telemetry;

use crate::api::ServiceContainer;
use crate::config::Config;
use crate::services::auth_service::AuthService;
use crate::services::health_service::HealthService;
use crate::services::user_service::UserService;
use crate::storage::memory::InMemoryUserRepository;
use crate::storage::user_repo::PgUserRepository;
use crate::storage::{DbPool, UserStore};
use std::sync::Arc;
use tokio::sync::watch;

/// Fully wired application components, ready to be mounted on routers.
#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub health_service: HealthService,
}

#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    store: Option<Arc<dyn UserStore>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, store: None }
    }

    #[must_use]
    pub fn with_database(mut self, pool: DbPool) -> Self {
        self.store = Some(Arc::new(PgUserRepository::new(pool)));
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn UserStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Falls back to an in-memory store when none was provided.
    #[must_use]
    pub fn build(self) -> App {
        let store = self.store.unwrap_or_else(|| {
            tracing::warn!("No database configured, users will not survive a restart");
            Arc::new(InMemoryUserRepository::new())
        });

        let auth_service = AuthService::new(Arc::clone(&store));
        let user_service = UserService::new(Arc::clone(&store), auth_service.clone(), self.config.users.token_policy);
        let health_service = HealthService::new(store, self.config.health);

        App { services: ServiceContainer { user_service, auth_service }, health_service }
    }
}

/// Applies the embedded SQL migrations.
///
/// # Errors
/// Returns an error if a migration fails to apply.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}

/// Routes panics through tracing so they reach the configured log sinks.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(|l| format!("{}:{}", l.file(), l.line())).unwrap_or_default();
        tracing::error!(panic = %info, location = %location, "Panic occurred");
    }));
}

/// Flips the shutdown channel on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}
