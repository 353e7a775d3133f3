//! Upload storage subsystem.
//!
//! # Data Flow
//! ```text
//! Upload (original name)
//!     → sanitizer.rs (optional: timestamped, randomized, encoded name)
//!     → store.rs (validate segment, write under the upload root)
//!
//! Startup:  store.initialize()  → directory exists and is empty
//! Shutdown: store.seal() + store.purge_all() → directory empty, uploads refused
//! ```
//!
//! # Design Decisions
//! - The directory listing is the only source of truth; there is no index
//! - Every name is checked to be a single path segment before touching disk
//! - Purge failures are reported, never propagated

pub mod error;
pub mod sanitizer;
pub mod store;

pub use error::{BoxError, InitError, StoreError, StoreResult};
pub use sanitizer::{decode_original, sanitize_file_name};
pub use store::{DirectoryStore, PurgeFailure, PurgeReport, StoredFile};
