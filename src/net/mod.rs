//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! config.listener
//!     → listener.rs (parse address, bind TCP socket)
//!     → hand off to axum::serve
//!
//! Every request:
//!     → connection.rs (in-flight tracking for drain visibility)
//! ```

pub mod connection;
pub mod listener;

pub use connection::{InFlightGuard, InFlightTracker};
pub use listener::{bind, ListenerError};
