use std::{io, path::PathBuf};

use thiserror::Error;

/// Main error type for the cansync application.
///
/// Covers I/O against canvas files and the pending log, JSON parsing,
/// configuration loading, and the synchronization failure taxonomy used by
/// the retry layer.
#[derive(Debug, Error)]
pub enum Error {
   /// I/O error occurred during file operations.
   #[error("io error: {0}")]
   Io(#[from] io::Error),

   /// JSON serialization or deserialization error occurred.
   #[error("json error: {0}")]
   Json(#[from] serde_json::Error),

   /// Configuration-related error occurred.
   #[error("config error: {0}")]
   Config(#[from] ConfigError),

   /// Synchronization failure (see [`SyncError`] for the taxonomy).
   #[error(transparent)]
   Sync(#[from] SyncError),
}

/// Failure taxonomy for synchronization attempts.
///
/// The retry layer distinguishes fatal variants (never retried) from
/// transient ones. Cancellation of a superseded debounce task is not an
/// error and therefore has no variant here.
#[derive(Debug, Error)]
pub enum SyncError {
   /// A backing-store client could not be constructed. Permanent for the
   /// lifetime of the client slot; short-circuits all future retries.
   #[error("{client} client unavailable: {reason}")]
   ClientUnavailable { client: &'static str, reason: String },

   /// The canvas file no longer exists on disk.
   #[error("canvas not found: {path}", path = .0.display())]
   CanvasNotFound(PathBuf),

   /// A backing-store operation exceeded its hard timeout.
   #[error("{op} timed out after {elapsed_ms}ms")]
   Timeout { op: &'static str, elapsed_ms: u64 },

   /// A backing-store write failed in a way that may self-heal.
   #[error("transient {op} failure: {reason}")]
   TransientWrite { op: &'static str, reason: String },
}

impl SyncError {
   /// Whether this failure can never succeed on retry.
   pub const fn is_fatal(&self) -> bool {
      matches!(
         self,
         Self::ClientUnavailable { .. } | Self::CanvasNotFound(_)
      )
   }
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
   /// Failed to retrieve user directories (e.g., home directory).
   #[error("failed to get user directories")]
   GetUserDirectories,

   /// Config file is invalid or exceeds safety caps.
   #[error("invalid config: {0}")]
   Invalid(String),
}

impl From<notify::Error> for Error {
   fn from(e: notify::Error) -> Self {
      Self::Io(io::Error::other(e))
   }
}

/// Standard result type using [`enum@Error`] as the default error type
pub type Result<T, E = Error> = std::result::Result<T, E>;
