use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use rsvp_store::{InviteStore, RedbInviteStore, StoreOptions};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::rate_limit::RateLimiter;
use crate::router::{admin_router, public_router};
use crate::schema::InviteSchema;
use crate::seed;
use crate::state::AppState;

/// RSVP service: one store, a public listener and an admin listener.
pub struct RsvpServer {
    config: ServerConfig,
}

impl RsvpServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open the database at `config.db_path`, creating its directory, and
    /// apply the seed file if one is configured.
    pub fn open_store(config: &ServerConfig) -> ServerResult<RedbInviteStore> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = RedbInviteStore::open_with(
            &config.db_path,
            StoreOptions {
                lock_timeout: config.lock_timeout(),
            },
        )?;
        info!(path = %store.path().display(), "invite store opened");

        if let Some(seed_file) = &config.seed_file {
            seed::load_from_file(seed_file, &store)?;
        }
        Ok(store)
    }

    /// Serve both APIs until SIGINT or SIGTERM, then drain in-flight
    /// requests and close the store.
    pub async fn serve(self) -> ServerResult<()> {
        let config = self.config;

        let store_config = config.clone();
        let store = tokio::task::spawn_blocking(move || Self::open_store(&store_config))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))??;
        let store: Arc<dyn InviteStore> = Arc::new(store);

        let schema = Arc::new(InviteSchema::new(&config.schema)?);
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let sweeper = limiter.spawn_sweeper(config.rate_limit.sweep_interval());

        let state = AppState::new(Arc::clone(&store));
        let public = public_router(state.clone(), schema, limiter);
        let admin = admin_router(state);

        let public_listener = TcpListener::bind(config.bind_addr).await?;
        let admin_listener = TcpListener::bind(config.admin_bind_addr).await?;
        info!(addr = %config.bind_addr, "public API listening");
        info!(addr = %config.admin_bind_addr, "admin API listening");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let public_server = axum::serve(
            public_listener,
            public.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(wait_for(shutdown_rx.clone()))
        .into_future();
        let admin_server = axum::serve(admin_listener, admin)
            .with_graceful_shutdown(wait_for(shutdown_rx))
            .into_future();
        let signal = async move {
            shutdown_signal().await;
            info!("shutdown signal received, draining connections");
            let _ = shutdown_tx.send(true);
            Ok::<(), std::io::Error>(())
        };

        let served = tokio::try_join!(public_server, admin_server, signal);
        sweeper.abort();

        let close = tokio::task::spawn_blocking(move || store.close())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        served?;
        close?;
        info!("server stopped");
        Ok(())
    }
}

async fn wait_for(mut rx: watch::Receiver<bool>) {
    // A dropped sender also means shut down.
    let _ = rx.wait_for(|stop| *stop).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
