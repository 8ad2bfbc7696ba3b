//! Error types for container assembly.

use std::io;
use thiserror::Error;

/// Result type for assembly operations.
pub type AssemblyResult<T> = Result<T, AssemblyError>;

/// Errors that can occur while assembling a container.
///
/// Every variant is fatal to the whole assembly: a truncated archive is
/// unusable, so there is no per-entry retry and no partial cleanup of the
/// underlying stream — releasing it is the caller's responsibility.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Underlying stream failed while writing one entry (header, payload copy
    /// or close).
    #[error("unable to write zip entry '{path}' to container")]
    EntryWrite {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Underlying stream failed while flushing the central directory.
    #[error("unable to finish creating container archive")]
    Finalize(#[source] io::Error),

    /// Entry name collides with one already written in this assembly.
    /// Duplicate names have undefined interoperability, so they are rejected
    /// up front.
    #[error("duplicate zip entry '{0}' in container")]
    DuplicateEntry(String),

    /// Entry name is not a valid archive path (empty, absolute, traversing
    /// or using backslash separators).
    #[error("invalid zip entry name '{0}'")]
    InvalidEntryName(String),
}
