//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Build store → initialize directory → build router → bind listener
//!
//! Shutdown (controller.rs):
//!     Trigger → Draining → Purging → Closing → Stopped | ForcedStop
//!
//! Triggers (signals.rs, shutdown.rs):
//!     SIGINT/SIGTERM/SIGUSR2, handler panics, transport failure
//!         → Shutdown::trigger (first one wins)
//! ```
//!
//! # Design Decisions
//! - Directory verified before any traffic is accepted
//! - Purge runs before the listener closes; uploads are refused once sealed
//! - Shutdown has a timeout: forced exit after the grace period

pub mod controller;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use controller::{CloseSignal, ExitStatus, LifecycleController, ShutdownPhase};
pub use shutdown::{Shutdown, ShutdownReason};
pub use startup::{Service, StartupError};
