//! # OSS Core
//!
//! Startup wiring for the OSS content-addressed file store.
//!
//! This crate resolves runtime configuration once and opens the blob store it names:
//! - Environment parsing with defaults (`UPLOAD_DIR`, `OSS_REST_ADDR`, `OSS_MAX_UPLOAD_BYTES`)
//! - Storage root bootstrap, treated as a fatal error if it fails
//!
//! **No API concerns**: HTTP servers, routing and wire formats belong in `api-rest` and
//! `api-shared`.

pub mod config;
pub mod constants;
mod error;

pub use config::CoreConfig;
pub use constants::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_REST_ADDR, DEFAULT_UPLOAD_DIR};
pub use error::{CoreError, CoreResult};
pub use oss_files::{BlobStore, FilesError, PutOutcome, StoredFilename};
