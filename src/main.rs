//! Upload relay service.
//!
//! Accepts file uploads into a single upload directory, lists and deletes
//! them, serves them read-only, and relays chat messages to a backend.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                  UPLOAD RELAY                     │
//!                        │                                                   │
//!   Client Request       │  ┌─────────┐    ┌─────────┐    ┌──────────────┐  │
//!   ─────────────────────┼─▶│   net   │───▶│  http   │───▶│   storage    │  │
//!                        │  │listener │    │ router  │    │DirectoryStore│  │
//!                        │  └─────────┘    └────┬────┘    └──────────────┘  │
//!                        │                      │                            │
//!                        │                      ▼                            │
//!                        │               ┌──────────────┐                    │
//!                        │               │     chat     │────────────────────┼──▶ Chat backend
//!                        │               │    relay     │                    │
//!                        │               └──────────────┘                    │
//!                        │                                                   │
//!                        │  ┌─────────────────────────────────────────────┐  │
//!                        │  │            Cross-Cutting Concerns            │  │
//!                        │  │  ┌────────┐ ┌──────────────┐ ┌───────────┐  │  │
//!                        │  │  │ config │ │observability │ │ lifecycle │  │  │
//!                        │  │  └────────┘ └──────────────┘ └───────────┘  │  │
//!                        │  └─────────────────────────────────────────────┘  │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use upload_relay::config::{load_config, ServiceConfig};
use upload_relay::lifecycle::{signals, ExitStatus, Service};
use upload_relay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "upload-relay")]
#[command(about = "File upload service with a chat backend relay", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("upload-relay v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upload_dir = %config.storage.upload_dir,
        naming = ?config.storage.naming,
        backend_url = %config.chat.backend_url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let service = match Service::start(config).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            std::process::exit(ExitStatus::FatalInit.code());
        }
    };

    let _signals = signals::spawn_signal_listener(service.shutdown())?;
    signals::install_panic_hook(service.shutdown());

    let status = service.run().await;
    tracing::info!(status = ?status, "Shutdown complete");
    std::process::exit(status.code());
}
