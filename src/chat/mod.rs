//! Chat backend relay.
//!
//! # Data Flow
//! ```text
//! POST /api/send-message {message, attachment}
//!     → client.rs (POST JSON to the configured backend URL)
//!     → backend JSON passed back untouched
//! ```
//!
//! # Design Decisions
//! - The backend is opaque: only the request shape and "JSON back" are assumed
//! - Connection refusal is reported separately from every other failure
//! - No client-side timeout; the call waits as long as the backend does

pub mod client;
pub mod types;

pub use client::ChatClient;
pub use types::{ChatError, ChatRequest, ChatResult};
