//! Multipart upload coordination for partsign.
//!
//! This crate wires the SigV4 engine to an object store:
//!
//! - [`coordinator`] - the stateless initiate / sign-part / complete / abort broker
//! - [`store`] - the object-store contract with S3 and in-memory backends
//! - [`handler`] - the [`UploadHandler`](partsign_http::UploadHandler) implementation
//! - [`config`] - environment-driven configuration
//! - [`clock`] - time source, frozen in tests
//! - [`checksums`] - part and multipart ETags for the in-memory store

pub mod checksums;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod handler;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, StoreKind, UploadConfig};
pub use coordinator::UploadCoordinator;
pub use handler::PartsignHandler;
pub use store::{MemoryObjectStore, ObjectStore, S3ObjectStore, StoreError};
