//! Upload relay library: upload-directory lifecycle, file API and chat relay.

pub mod chat;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod storage;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::{ExitStatus, Service, Shutdown};
pub use storage::DirectoryStore;
