//! Flat-directory blob store implementation
//!
//! This module provides the [`BlobStore`] type, which owns one storage root and implements the
//! write-if-absent and safe-read paths of the service.
//!
//! # Write Path
//!
//! 1. The original filename contributes only a sanitized extension
//! 2. The content is hashed to its [`ContentId`](oss_hash::ContentId)
//! 3. If `<id><ext>` already exists the upload is a no-op (dedup)
//! 4. Otherwise the bytes go to a private temporary file in the root, are synced, and are then
//!    moved into place with a no-clobber rename
//!
//! The rename is the only serialisation point. Two processes racing to store the same content
//! both succeed: one rename lands, the other finds the name taken and discards its temporary
//! file. Readers therefore see either nothing or the complete blob.
//!
//! # Read Path
//!
//! Requested names are checked for traversal before anything touches the filesystem. Names that
//! are safe but not shaped like a stored filename cannot exist and are reported as not found.
//! Symlinks inside the root are never followed.

use crate::constants::{DEFAULT_MEDIA_TYPE, STALE_TEMP_FILE_SECS, TEMP_FILE_PREFIX, TEMP_FILE_SUFFIX};
use crate::name::{validate_requested_name, Extension, StoredFilename};
use crate::{FilesError, FilesResult};
use chrono::{DateTime, Utc};
use oss_hash::identifier;
use std::fmt::Display;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Result of a successful [`BlobStore::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutcome {
    /// Public handle of the blob
    pub stored_filename: StoredFilename,

    /// `false` when identical content was already stored under this name
    pub created: bool,

    /// Size of the content in bytes
    pub size_bytes: u64,
}

/// A blob read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub name: StoredFilename,
    pub bytes: Vec<u8>,
}

impl Blob {
    /// Best-effort content type for serving this blob.
    pub fn media_type(&self) -> String {
        media_type(&self.name, &self.bytes)
    }
}

/// Listing entry for a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BlobInfo {
    pub name: StoredFilename,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

/// Outcome of an integrity scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Number of blobs whose content was rehashed
    pub checked: usize,

    /// Blobs whose content no longer matches the identifier in their name
    pub corrupt: Vec<StoredFilename>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.corrupt.is_empty()
    }
}

/// Content-addressed store rooted at a single directory.
///
/// Cheap to clone; every clone refers to the same root.
#[derive(Debug, Clone)]
pub struct BlobStore {
    /// Canonicalised storage root
    root: PathBuf,
}

impl BlobStore {
    /// Opens the store at `root`, creating the directory if it does not exist.
    ///
    /// Temporary files older than an hour are assumed to be left over from interrupted writes
    /// and are removed. Younger ones may belong to a writer in another process and are kept.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - The directory cannot be created or canonicalised
    /// - The path exists but is not a directory
    /// - The orphan sweep fails (I/O)
    pub fn open(root: &Path) -> FilesResult<Self> {
        if root.exists() && !root.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root.display()
            )));
        }

        fs::create_dir_all(root).map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot create directory {}: {}",
                root.display(),
                e
            ))
        })?;

        let root = root.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root.display(),
                e
            ))
        })?;

        let store = Self { root };

        let swept = store.sweep_temp_files(Duration::from_secs(STALE_TEMP_FILE_SECS))?;
        if swept > 0 {
            tracing::warn!(count = swept, "removed orphaned temporary uploads");
        }

        tracing::info!(root = %store.root.display(), "blob store ready");
        Ok(store)
    }

    /// Returns the canonicalised storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores `bytes` under a name derived from their content.
    ///
    /// Storing content that is already present is not an error: the existing blob is left
    /// untouched and the same name is returned with `created == false`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - `original_filename` is blank, contains path components or has an unsafe extension
    /// - `bytes` is empty
    /// - Something other than a regular file occupies the target name
    /// - The temporary write or the final rename fails (I/O)
    pub fn put(&self, bytes: &[u8], original_filename: &str) -> FilesResult<PutOutcome> {
        let extension = Extension::from_original_filename(original_filename)?;
        if bytes.is_empty() {
            return Err(FilesError::EmptyContent);
        }

        let id = identifier(bytes);
        let stored_filename = StoredFilename::new(&id, &extension);
        let path = self.storage_path(&stored_filename)?;

        let created = match fs::symlink_metadata(&path) {
            Ok(metadata) if metadata.is_file() => false,
            Ok(_) => {
                return Err(FilesError::NotARegularFile(stored_filename.to_string()));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.write_atomically(&path, bytes)?,
            Err(e) => {
                return Err(io_error(
                    e,
                    format_args!("Failed to inspect {}", path.display()),
                ));
            }
        };

        if created {
            tracing::info!(name = %stored_filename, size = bytes.len(), "stored new blob");
        } else {
            tracing::debug!(name = %stored_filename, "blob already present, skipping write");
        }

        Ok(PutOutcome {
            stored_filename,
            created,
            size_bytes: bytes.len() as u64,
        })
    }

    /// Reads the blob stored under `requested`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - `requested` is unsafe ([`FilesError::InvalidName`])
    /// - No regular file is stored under that name ([`FilesError::NotFound`])
    /// - The file cannot be read (I/O)
    pub fn get(&self, requested: &str) -> FilesResult<Vec<u8>> {
        self.fetch(requested).map(|blob| blob.bytes)
    }

    /// Like [`BlobStore::get`], but also returns the parsed name.
    pub fn fetch(&self, requested: &str) -> FilesResult<Blob> {
        let name = self.resolve_requested(requested)?;
        let path = self.storage_path(&name)?;

        if !is_regular_file(&path)? {
            return Err(FilesError::NotFound(requested.to_owned()));
        }

        match read_no_follow(&path) {
            Ok(Some(bytes)) => Ok(Blob { name, bytes }),
            Ok(None) => Err(FilesError::NotFound(requested.to_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FilesError::NotFound(requested.to_owned()))
            }
            Err(e) => Err(io_error(
                e,
                format_args!("Failed to read blob {}", path.display()),
            )),
        }
    }

    /// True if a blob is stored under `requested`. Unsafe names are never contained.
    pub fn contains(&self, requested: &str) -> bool {
        self.resolve_requested(requested)
            .and_then(|name| self.storage_path(&name))
            .and_then(|path| is_regular_file(&path))
            .unwrap_or(false)
    }

    /// Lists every stored blob, sorted by name.
    ///
    /// Temporary files and anything not shaped like a stored filename are skipped.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Io` if the root cannot be read.
    pub fn list(&self) -> FilesResult<Vec<BlobInfo>> {
        let mut blobs = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Ok(name) = StoredFilename::parse(name) else {
                continue;
            };

            // DirEntry::metadata does not follow symlinks
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            blobs.push(BlobInfo {
                name,
                size_bytes: metadata.len(),
                modified: DateTime::<Utc>::from(metadata.modified()?),
            });
        }

        blobs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(blobs)
    }

    /// Rehashes every blob and reports those whose content no longer matches their name.
    ///
    /// Read-only: corrupt blobs are reported, never removed.
    pub fn verify(&self) -> FilesResult<VerifyReport> {
        let mut report = VerifyReport::default();

        for blob in self.list()? {
            let path = self.storage_path(&blob.name)?;
            let bytes = fs::read(&path)
                .map_err(|e| io_error(e, format_args!("Failed to read blob {}", path.display())))?;

            report.checked += 1;
            if !blob.name.content_id().verify(&bytes) {
                tracing::error!(name = %blob.name, "stored content does not match its identifier");
                report.corrupt.push(blob.name);
            }
        }

        Ok(report)
    }

    /// Removes temporary upload files last modified more than `older_than` ago.
    ///
    /// Returns the number of files removed.
    pub fn sweep_temp_files(&self, older_than: Duration) -> FilesResult<usize> {
        let Some(cutoff) = SystemTime::now().checked_sub(older_than) else {
            return Ok(0);
        };

        let mut removed = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !(name.starts_with(TEMP_FILE_PREFIX) && name.ends_with(TEMP_FILE_SUFFIX)) {
                continue;
            }

            // A writer may rename its temporary file into place at any point during the scan
            let modified = match entry.metadata().and_then(|m| {
                let is_file = m.is_file();
                m.modified().map(|modified| (is_file, modified))
            }) {
                Ok((true, modified)) => modified,
                Ok((false, _)) => continue,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(io_error(
                        e,
                        format_args!("Failed to inspect {}", entry.path().display()),
                    ));
                }
            };
            if modified > cutoff {
                continue;
            }

            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                // Another process got there first
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(io_error(
                        e,
                        format_args!("Failed to remove {}", entry.path().display()),
                    ));
                }
            }
        }

        Ok(removed)
    }

    /// Validates a client-supplied fetch name and parses it.
    ///
    /// Unsafe names are client errors; safe names that cannot be stored filenames are simply
    /// not found.
    fn resolve_requested(&self, requested: &str) -> FilesResult<StoredFilename> {
        validate_requested_name(requested)?;
        StoredFilename::parse(requested).map_err(|_| FilesError::NotFound(requested.to_owned()))
    }

    /// Joins a stored filename onto the root and checks that the result is a direct child.
    fn storage_path(&self, name: &StoredFilename) -> FilesResult<PathBuf> {
        let path = self.root.join(name.as_str());
        if path.parent() != Some(self.root.as_path()) {
            return Err(FilesError::PathEscapesRoot(name.to_string()));
        }
        Ok(path)
    }

    /// Writes `bytes` to `path` via a temporary file and a no-clobber rename.
    ///
    /// Returns `false` if another writer created `path` first, in which case the temporary
    /// file is discarded.
    fn write_atomically(&self, path: &Path, bytes: &[u8]) -> FilesResult<bool> {
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(TEMP_FILE_SUFFIX)
            .tempfile_in(&self.root)
            .map_err(|e| {
                io_error(
                    e,
                    format_args!("Failed to create temporary file in {}", self.root.display()),
                )
            })?;

        temp.write_all(bytes)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| {
                io_error(
                    e,
                    format_args!("Failed to write temporary file {}", temp.path().display()),
                )
            })?;

        match temp.persist_noclobber(path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(io_error(
                e.error,
                format_args!("Failed to move blob into place at {}", path.display()),
            )),
        }
    }
}

/// Best-effort content type for a blob.
///
/// The extension decides first; content sniffing is the fallback for blobs stored without a
/// recognised extension.
pub fn media_type(name: &StoredFilename, bytes: &[u8]) -> String {
    name.extension()
        .without_dot()
        .and_then(|ext| mime_guess::from_ext(ext).first_raw())
        .or_else(|| infer::get(bytes).map(|kind| kind.mime_type()))
        .unwrap_or(DEFAULT_MEDIA_TYPE)
        .to_owned()
}

fn is_regular_file(path: &Path) -> FilesResult<bool> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(e, format_args!("Failed to inspect {}", path.display()))),
    }
}

/// Reads `path` only if it is a regular file, refusing to traverse a final symlink.
///
/// Returns `Ok(None)` when something other than a regular file sits at `path`, including a
/// symlink swapped in after the caller's own check.
#[cfg(unix)]
fn read_no_follow(path: &Path) -> io::Result<Option<Vec<u8>>> {
    use std::io::Read;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = match fs::OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NOFOLLOW | libc::O_NONBLOCK)
        .open(path)
    {
        Ok(file) => file,
        Err(e) if e.raw_os_error() == Some(libc::ELOOP) => return Ok(None),
        Err(e) => return Err(e),
    };

    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Ok(None);
    }

    let mut bytes = Vec::with_capacity(metadata.len() as usize);
    file.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

#[cfg(not(unix))]
fn read_no_follow(path: &Path) -> io::Result<Option<Vec<u8>>> {
    fs::read(path).map(Some)
}

fn io_error(e: io::Error, context: impl Display) -> FilesError {
    FilesError::Io(io::Error::new(e.kind(), format!("{}: {}", context, e)))
}
