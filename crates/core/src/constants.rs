//! Constants used throughout the OSS core crate.
//!
//! Environment variable names and their defaults live here so the binaries and the tests agree
//! on them.

/// Environment variable naming the storage root.
pub const UPLOAD_DIR_ENV: &str = "UPLOAD_DIR";

/// Environment variable naming the REST listen address.
pub const REST_ADDR_ENV: &str = "OSS_REST_ADDR";

/// Environment variable bounding the size of an upload request body.
pub const MAX_UPLOAD_BYTES_ENV: &str = "OSS_MAX_UPLOAD_BYTES";

/// Default storage root when no explicit directory is configured.
pub const DEFAULT_UPLOAD_DIR: &str = "./uploads";

/// Default REST listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:5000";

/// Default request body limit (16 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
