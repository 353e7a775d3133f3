//! Startup orchestration.
//!
//! Order matters: the upload directory is verified before the listener is
//! bound, so no request is ever served against an unknown directory state.
//! Any startup error is fatal.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::chat::ChatError;
use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::controller::{ExitStatus, LifecycleController, ShutdownPhase};
use crate::lifecycle::shutdown::Shutdown;
use crate::net::{self, InFlightTracker, ListenerError};
use crate::storage::{DirectoryStore, InitError};

/// Errors that prevent the service from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Upload directory initialization failed: {0}")]
    Storage(#[from] InitError),

    #[error("Listener setup failed: {0}")]
    Listener(#[from] ListenerError),

    #[error("Chat relay setup failed: {0}")]
    Chat(#[from] ChatError),
}

/// A fully initialized service, bound and ready to serve.
pub struct Service {
    server: HttpServer,
    listener: TcpListener,
    controller: LifecycleController,
    shutdown: Shutdown,
    local_addr: SocketAddr,
}

impl Service {
    /// Initialize storage, build the router and bind the listener.
    pub async fn start(config: ServiceConfig) -> Result<Self, StartupError> {
        let store = Arc::new(DirectoryStore::new(&config.storage.upload_dir));
        store.initialize().await?;

        let shutdown = Shutdown::new();
        let in_flight = InFlightTracker::new();
        let server = HttpServer::new(
            &config,
            Arc::clone(&store),
            shutdown.clone(),
            in_flight.clone(),
        )?;

        let listener = net::bind(&config.listener).await?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        let controller = LifecycleController::new(
            store,
            shutdown.clone(),
            in_flight,
            Duration::from_secs(config.shutdown.grace_period_secs),
        );

        Ok(Self {
            server,
            listener,
            controller,
            shutdown,
            local_addr,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle for requesting shutdown.
    pub fn shutdown(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Observe shutdown phase transitions.
    pub fn phases(&self) -> watch::Receiver<ShutdownPhase> {
        self.controller.phases()
    }

    /// Serve until shutdown completes and report how the process should exit.
    pub async fn run(self) -> ExitStatus {
        let Self {
            server,
            listener,
            controller,
            ..
        } = self;
        controller
            .run(move |close| server.run(listener, close.recv()))
            .await
    }
}
