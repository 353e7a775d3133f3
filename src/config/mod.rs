//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → cloned into subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the upload root never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ChatConfig;
pub use schema::ListenerConfig;
pub use schema::NamingPolicy;
pub use schema::ObservabilityConfig;
pub use schema::ServiceConfig;
pub use schema::ShutdownConfig;
pub use schema::StaticFilesConfig;
pub use schema::StorageConfig;
