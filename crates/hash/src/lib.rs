//! Content identifiers.
//!
//! OSS names every stored blob after its content. The identifier is the SHA-256 digest of the
//! blob's bytes, rendered as **64 lowercase hexadecimal characters**.
//!
//! This crate provides:
//! - A wrapper type ([`ContentId`]) that *guarantees* the canonical format once constructed.
//! - The hashing entry point ([`identifier`]) used by the upload path.
//!
//! ## Canonical form
//! - Length: 64 (the full digest, never truncated)
//! - Characters: `0-9` and `a-f` only
//! - Example: `ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad` (`"abc"`)
//!
//! ## Collision bound
//! With `n` stored blobs the probability of any two distinct contents sharing an identifier is
//! bounded by roughly `n² / 2²⁵⁷`. The identifier length is part of the public URL contract, so
//! changing it would orphan every previously issued handle.

mod content_id;

pub use content_id::{identifier, ContentId, CONTENT_ID_HEX_LEN};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// Input was not a canonical identifier
    #[error("Invalid content identifier: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type HashResult<T> = Result<T, HashError>;
