//! OSS Blob Storage
//!
//! This crate provides the content-addressed blob store behind the OSS upload service.
//!
//! ## Design Principles
//!
//! - A blob's name is derived from its bytes, never from client input
//! - Blobs are immutable once written (write-once, never deleted)
//! - Uploading identical content twice stores it once
//! - Readers never observe a partially written blob
//! - Every client-supplied name is treated as hostile
//!
//! ## Storage Model
//!
//! One flat directory holds every blob. There is no index or metadata file; the presence of a
//! regular file is the only source of truth:
//!
//! ```text
//! <storage_root>/
//! ├── ba7816bf…15ad.txt      # sha256("abc") + original extension
//! ├── e3b0c442…b855          # no extension
//! └── .upload-Xa91Qz.tmp     # in-flight write, never served
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use oss_files::BlobStore;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = BlobStore::open(Path::new("uploads"))?;
//!
//! let outcome = store.put(b"abc", "a.txt")?;
//! assert_eq!(store.get(outcome.stored_filename.as_str())?, b"abc");
//! # Ok(())
//! # }
//! ```

mod constants;
mod name;
mod store;

pub use constants::{
    DEFAULT_MEDIA_TYPE, MAX_EXTENSION_LEN, MAX_REQUESTED_NAME_LEN, TEMP_FILE_PREFIX,
    TEMP_FILE_SUFFIX,
};
pub use name::{validate_requested_name, Extension, StoredFilename};
pub use oss_hash::{identifier, ContentId};
pub use store::{media_type, Blob, BlobInfo, BlobStore, PutOutcome, VerifyReport};

/// Errors that can occur during blob operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Storage root could not be created or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Upload carried no bytes
    #[error("Uploaded file is empty")]
    EmptyContent,

    /// Upload carried no filename
    #[error("No selected file")]
    MissingFilename,

    /// Upload filename contained path components
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    /// Upload filename had an extension that is not a simple suffix
    #[error(
        "Invalid file extension '{0}': use 1-{max} ASCII letters, digits, '-' or '_' after the dot",
        max = MAX_EXTENSION_LEN
    )]
    InvalidExtension(String),

    /// Requested name is unsafe (traversal, separators, hidden files)
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    /// Resolved path would leave the storage root
    #[error("Path escapes storage root: {0}")]
    PathEscapesRoot(String),

    /// No blob is stored under the requested name
    #[error("File not found: {0}")]
    NotFound(String),

    /// Something other than a regular file occupies a stored filename
    #[error("Storage path is not a regular file: {0}")]
    NotARegularFile(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilesError {
    /// True for errors caused by the caller's input rather than by storage.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyContent
                | Self::MissingFilename
                | Self::InvalidFilename(_)
                | Self::InvalidExtension(_)
                | Self::InvalidName(_)
                | Self::PathEscapesRoot(_)
        )
    }
}

/// Result type for blob operations.
pub type FilesResult<T> = Result<T, FilesError>;
