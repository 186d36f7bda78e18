//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the HTTP layer. Request handlers never read process-wide environment variables;
//! doing so leads to inconsistent behaviour in multi-threaded runtimes and test harnesses.

use crate::constants::{
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_REST_ADDR, DEFAULT_UPLOAD_DIR, MAX_UPLOAD_BYTES_ENV,
    REST_ADDR_ENV, UPLOAD_DIR_ENV,
};
use crate::{CoreError, CoreResult};
use oss_files::BlobStore;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    upload_dir: PathBuf,
    rest_addr: SocketAddr,
    max_upload_bytes: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        upload_dir: PathBuf,
        rest_addr: SocketAddr,
        max_upload_bytes: usize,
    ) -> CoreResult<Self> {
        if upload_dir.as_os_str().is_empty() {
            return Err(CoreError::InvalidConfig(
                "upload directory cannot be empty".into(),
            ));
        }

        if max_upload_bytes == 0 {
            return Err(CoreError::InvalidConfig(
                "maximum upload size must be greater than zero".into(),
            ));
        }

        Ok(Self {
            upload_dir,
            rest_addr,
            max_upload_bytes,
        })
    }

    /// Resolve configuration from the process environment.
    ///
    /// Unset or blank variables fall back to their defaults; set but invalid values are errors.
    pub fn from_env() -> CoreResult<Self> {
        let cfg = Self::new(
            upload_dir_from_env_value(std::env::var(UPLOAD_DIR_ENV).ok()),
            rest_addr_from_env_value(std::env::var(REST_ADDR_ENV).ok())?,
            max_upload_bytes_from_env_value(std::env::var(MAX_UPLOAD_BYTES_ENV).ok())?,
        )?;
        tracing::debug!(?cfg, "resolved configuration");
        Ok(cfg)
    }

    /// Returns a copy of this configuration with a different storage root.
    pub fn with_upload_dir(self, upload_dir: PathBuf) -> CoreResult<Self> {
        Self::new(upload_dir, self.rest_addr, self.max_upload_bytes)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn rest_addr(&self) -> SocketAddr {
        self.rest_addr
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Open (creating if needed) the blob store at the configured root.
    ///
    /// Intended to run once before serving; a failure here is fatal.
    pub fn open_store(&self) -> CoreResult<BlobStore> {
        Ok(BlobStore::open(&self.upload_dir)?)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the storage root from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_UPLOAD_DIR`].
pub fn upload_dir_from_env_value(value: Option<String>) -> PathBuf {
    PathBuf::from(non_blank(value).unwrap_or_else(|| DEFAULT_UPLOAD_DIR.into()))
}

/// Parse the REST listen address from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_REST_ADDR`].
pub fn rest_addr_from_env_value(value: Option<String>) -> CoreResult<SocketAddr> {
    let value = non_blank(value).unwrap_or_else(|| DEFAULT_REST_ADDR.into());
    value.parse().map_err(|e| {
        CoreError::InvalidConfig(format!(
            "{} is not a socket address ({}): {}",
            REST_ADDR_ENV, e, value
        ))
    })
}

/// Parse the request body limit from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_MAX_UPLOAD_BYTES`].
pub fn max_upload_bytes_from_env_value(value: Option<String>) -> CoreResult<usize> {
    let Some(value) = non_blank(value) else {
        return Ok(DEFAULT_MAX_UPLOAD_BYTES);
    };

    match value.parse::<usize>() {
        Ok(0) => Err(CoreError::InvalidConfig(format!(
            "{} must be greater than zero",
            MAX_UPLOAD_BYTES_ENV
        ))),
        Ok(bytes) => Ok(bytes),
        Err(e) => Err(CoreError::InvalidConfig(format!(
            "{} is not a byte count ({}): {}",
            MAX_UPLOAD_BYTES_ENV, e, value
        ))),
    }
}
