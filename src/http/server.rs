//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Serve uploaded files read-only and the front-end assets
//! - Wire up middleware (request ID, tracing, in-flight tracking, panics, body limit)
//! - Serve on a listener until the close signal, then drain

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::chat::{ChatClient, ChatResult};
use crate::config::{NamingPolicy, ServiceConfig};
use crate::http::handlers;
use crate::http::request::{panic_responder, request_span, track_in_flight};
use crate::lifecycle::Shutdown;
use crate::net::InFlightTracker;
use crate::storage::DirectoryStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DirectoryStore>,
    pub chat: ChatClient,
    pub naming: NamingPolicy,
    pub uploads_prefix: String,
}

/// HTTP front end for the upload directory and chat relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(
        config: &ServiceConfig,
        store: Arc<DirectoryStore>,
        shutdown: Shutdown,
        in_flight: InFlightTracker,
    ) -> ChatResult<Self> {
        let state = AppState {
            store,
            chat: ChatClient::new(&config.chat)?,
            naming: config.storage.naming,
            uploads_prefix: config.static_files.uploads_prefix.clone(),
        };

        let router = Self::build_router(config, state, shutdown, in_flight);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &ServiceConfig,
        state: AppState,
        shutdown: Shutdown,
        in_flight: InFlightTracker,
    ) -> Router {
        let uploads = ServeDir::new(state.store.root());
        let public = ServeDir::new(&config.static_files.public_dir);

        Router::new()
            .route("/api/files", get(handlers::list_files))
            .route("/api/files/{filename}", delete(handlers::delete_file))
            .route("/api/upload", post(handlers::upload_files))
            .route("/api/send-message", post(handlers::send_message))
            .nest_service(&config.static_files.uploads_prefix, uploads)
            .fallback_service(public)
            .layer(DefaultBodyLimit::max(config.storage.max_upload_bytes))
            .with_state(state)
            .layer(middleware::from_fn_with_state(in_flight, track_in_flight))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(CatchPanicLayer::custom(panic_responder(shutdown))),
            )
    }

    /// The assembled router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `close` resolves, then wait for open
    /// connections to finish.
    pub async fn run<F>(self, listener: TcpListener, close: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Server running at http://{}", addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(close)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
