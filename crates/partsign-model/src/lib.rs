//! Wire types for the partsign upload API.
//!
//! The inbound API is JSON with camelCase field names. Inputs and outputs are
//! plain serde structs; [`UploadOperation`] names the routes and
//! [`UploadError`] is the error every layer above the signer converts into.

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod input;
pub mod operations;
pub mod output;

pub use error::{UploadError, UploadErrorCode};
pub use operations::UploadOperation;
