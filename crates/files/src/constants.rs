//! Constants shared by the blob store.

/// Prefix of in-flight temporary files inside the storage root.
///
/// Starts with a dot so it can never collide with a stored filename, and so the read path
/// refuses to serve it.
pub const TEMP_FILE_PREFIX: &str = ".upload-";

/// Suffix of in-flight temporary files inside the storage root.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Temporary files older than this are treated as orphans of an interrupted write.
pub const STALE_TEMP_FILE_SECS: u64 = 60 * 60;

/// Maximum number of characters after the dot in a stored extension.
pub const MAX_EXTENSION_LEN: usize = 16;

/// Upper bound on the length of a fetch name; longer names cannot be stored filenames.
pub const MAX_REQUESTED_NAME_LEN: usize = 255;

/// Content type served when neither the extension nor the bytes identify one.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";
