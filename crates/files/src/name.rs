//! Stored filenames and the validation of client-supplied names.
//!
//! Every name that reaches this module is untrusted. Upload filenames only contribute an
//! extension, and that extension must be a short run of ASCII alphanumerics, `-` or `_`.
//! Fetch names must be exactly `<content id><extension?>`; anything else can never exist in the
//! store.

use crate::constants::{MAX_EXTENSION_LEN, MAX_REQUESTED_NAME_LEN};
use crate::{FilesError, FilesResult};
use oss_hash::{ContentId, CONTENT_ID_HEX_LEN};
use std::fmt;

/// A sanitized file extension, either empty or `.` followed by 1-16 safe characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Extension(String);

impl Extension {
    /// The empty extension, used for uploads whose filename has none.
    pub fn none() -> Self {
        Self(String::new())
    }

    /// Extracts and sanitizes the extension of an upload's original filename.
    ///
    /// The extension starts at the last `.` of the name; leading dots do not count, so
    /// `.bashrc` has no extension. Case is preserved.
    ///
    /// # Errors
    ///
    /// - [`FilesError::MissingFilename`] if the name is empty or blank
    /// - [`FilesError::InvalidFilename`] if the name contains a path separator or NUL
    /// - [`FilesError::InvalidExtension`] if the extension is not a simple suffix
    pub fn from_original_filename(original: &str) -> FilesResult<Self> {
        if original.trim().is_empty() {
            return Err(FilesError::MissingFilename);
        }

        if original.contains(|c: char| matches!(c, '/' | '\\' | '\0')) {
            return Err(FilesError::InvalidFilename(original.to_owned()));
        }

        let without_leading_dots = original.trim_start_matches('.');
        match without_leading_dots.rfind('.') {
            Some(dot) => Self::parse(&without_leading_dots[dot..]),
            None => Ok(Self::none()),
        }
    }

    /// Validates an extension string (`""` or `.ext`).
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidExtension`] if `input` is not a permitted extension.
    pub fn parse(input: &str) -> FilesResult<Self> {
        if input.is_empty() || Self::is_valid(input) {
            return Ok(Self(input.to_owned()));
        }
        Err(FilesError::InvalidExtension(input.to_owned()))
    }

    fn is_valid(input: &str) -> bool {
        let Some(suffix) = input.strip_prefix('.') else {
            return false;
        };
        !suffix.is_empty()
            && suffix.len() <= MAX_EXTENSION_LEN
            && suffix
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    /// Returns the extension including its leading dot, or `""`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The extension without its leading dot, if there is one.
    pub fn without_dot(&self) -> Option<&str> {
        self.0.strip_prefix('.')
    }
}

/// The public handle of a blob: its content identifier followed by its extension.
///
/// Because both halves are validated, a `StoredFilename` is always a single safe path
/// component and can be joined onto the storage root directly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoredFilename {
    name: String,
    id: ContentId,
    extension: Extension,
}

impl StoredFilename {
    pub fn new(id: &ContentId, extension: &Extension) -> Self {
        Self {
            name: format!("{}{}", id, extension.as_str()),
            id: id.clone(),
            extension: extension.clone(),
        }
    }

    /// Parses a name that must have the exact shape of a stored filename.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidName`] if `input` is not `<64 hex><extension?>`.
    pub fn parse(input: &str) -> FilesResult<Self> {
        let invalid = || FilesError::InvalidName(input.to_owned());

        let (id, extension) = match (
            input.get(..CONTENT_ID_HEX_LEN),
            input.get(CONTENT_ID_HEX_LEN..),
        ) {
            (Some(id), Some(extension)) => (id, extension),
            _ => return Err(invalid()),
        };

        let id = ContentId::parse(id).map_err(|_| invalid())?;
        let extension = Extension::parse(extension).map_err(|_| invalid())?;
        Ok(Self::new(&id, &extension))
    }

    /// The content identifier part of the name.
    pub fn content_id(&self) -> &ContentId {
        &self.id
    }

    /// The extension part of the name (possibly empty).
    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for StoredFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for StoredFilename {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl serde::Serialize for StoredFilename {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.name)
    }
}

/// Rejects fetch names that could address anything outside the storage root.
///
/// This runs before any shape check so that traversal attempts are reported as client errors
/// rather than silently folded into Not-Found. Names beginning with `.` are refused as well;
/// they are reserved for in-flight temporary files.
///
/// # Errors
///
/// Returns [`FilesError::InvalidName`] for empty, over-long, hidden or traversal-bearing names.
pub fn validate_requested_name(requested: &str) -> FilesResult<()> {
    let unsafe_name = requested.is_empty()
        || requested.len() > MAX_REQUESTED_NAME_LEN
        || requested.starts_with('.')
        || requested.contains("..")
        || requested
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control());

    if unsafe_name {
        return Err(FilesError::InvalidName(requested.to_owned()));
    }
    Ok(())
}
