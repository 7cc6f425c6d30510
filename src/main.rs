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

use std::net::SocketAddr;
use tokio::sync::watch;
use tracing::Instrument;
use userbase_server::api::MgmtState;
use userbase_server::config::Config;
use userbase_server::{AppBuilder, storage, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    userbase_server::setup_panic_hook();

    let boot_span = tracing::info_span!("boot_server");
    let (api_listener, mgmt_listener, app_router, mgmt_app, shutdown_tx, shutdown_rx) = async {
        // Phase 1: Infrastructure Setup (Resources)
        let mut builder = AppBuilder::new(config.clone());
        if let Some(database_url) = &config.database_url {
            let pool = storage::init_pool(database_url, config.db_max_connections).await?;
            userbase_server::run_migrations(&pool).await?;
            builder = builder.with_database(pool);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        userbase_server::spawn_signal_handler(shutdown_tx.clone());

        // Phase 2: Component Wiring
        let app = builder.build();

        // Phase 3: Runtime Setup (Listeners and Routers)
        let app_router = userbase_server::api::app_router(config.clone(), app.services);
        let mgmt_app = userbase_server::api::mgmt_router(MgmtState { health_service: app.health_service });

        let api_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let mgmt_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.mgmt_port).parse()?;

        tracing::info!(address = %api_addr, "listening");
        tracing::info!(address = %mgmt_addr, "management server listening");

        let api_listener = tokio::net::TcpListener::bind(api_addr).await?;
        let mgmt_listener = tokio::net::TcpListener::bind(mgmt_addr).await?;

        Ok::<_, anyhow::Error>((api_listener, mgmt_listener, app_router, mgmt_app, shutdown_tx, shutdown_rx))
    }
    .instrument(boot_span)
    .await?;

    // Phase 4: Start Runtime
    let mut api_rx = shutdown_rx.clone();
    let api_server = axum::serve(api_listener, app_router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = api_rx.wait_for(|&s| s).await;
        });

    let mut mgmt_rx = shutdown_rx.clone();
    let mgmt_server = axum::serve(mgmt_listener, mgmt_app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = mgmt_rx.wait_for(|&s| s).await;
        });

    let servers = async { tokio::try_join!(api_server, mgmt_server) };

    // Phase 5: Graceful Shutdown
    tokio::select! {
        result = servers => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Server error");
            }
        }
        () = async {
            let mut rx = shutdown_rx.clone();
            let _ = rx.wait_for(|&s| s).await;
            tokio::time::sleep(std::time::Duration::from_secs(config.server.shutdown_timeout_secs)).await;
        } => {
            tracing::warn!("Timeout waiting for connections to drain.");
        }
    }

    let _ = shutdown_tx.send(true);
    tracing::info!("Server stopped");
    telemetry_guard.shutdown();
    Ok(())
}
