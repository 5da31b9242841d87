//! Error taxonomy for conversion, playback, and session state.
//!
//! Conversion errors are serializable so terminal job events can carry them
//! across the event channel as plain strings without losing the category.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors terminating a conversion job.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConversionError {
    /// The text source was empty or whitespace-only; the job never starts.
    #[error("Input text is empty")]
    EmptyInput,

    /// The synthesis engine failed on a chunk. Fatal to the job; not retried.
    #[error("Speech synthesis failed on chunk {chunk}: {message}")]
    Synthesis {
        /// 0-based index of the failing chunk.
        chunk: usize,
        /// Engine error description.
        message: String,
    },

    /// Assembly or export of the output artifact failed. Fatal to the job.
    #[error("Export failed: {message}")]
    Export {
        /// Detailed error message.
        message: String,
    },

    /// I/O error on clip or output files.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g., "NotFound").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// The job was cancelled cooperatively. Not a failure.
    #[error("Conversion cancelled")]
    Cancelled,
}

impl ConversionError {
    /// Create a synthesis error for a chunk.
    pub fn synthesis(chunk: usize, message: impl Into<String>) -> Self {
        Self::Synthesis {
            chunk,
            message: message.into(),
        }
    }

    /// Create an export error.
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export {
            message: message.into(),
        }
    }

    /// Capture a `std::io::Error` as kind + message strings.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        Self::Io {
            kind: format!("{:?}", err.kind()),
            message: err.to_string(),
        }
    }

    /// Check if this is a cancellation rather than a failure.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<std::io::Error> for ConversionError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(&err)
    }
}

/// Errors from the playback engine and its device.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The output device failed to load or play a track.
    #[error("Audio device error: {0}")]
    Device(String),

    /// No track is bound to the session.
    #[error("No track bound")]
    NoTrack,

    /// The bound track no longer exists on disk.
    #[error("Track not readable: {0}")]
    UnreadableTrack(PathBuf),

    /// The duration probe could not read the track's metadata.
    #[error("Failed to read track metadata: {0}")]
    Metadata(String),
}

impl PlaybackError {
    /// Create a device error.
    pub fn device(message: impl Into<String>) -> Self {
        Self::Device(message.into())
    }

    /// Create a metadata error.
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata(message.into())
    }
}

/// Errors reading or writing the persisted state file.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file I/O failed.
    #[error("State file I/O failed at {path}: {source}")]
    Io {
        /// Path of the state file.
        path: PathBuf,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The state file held malformed JSON.
    #[error("State file at {path} is not valid JSON: {source}")]
    Malformed {
        /// Path of the state file.
        path: PathBuf,
        /// The parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A conversion job is already running; only one may run at a time.
    #[error("A conversion is already in progress")]
    ConversionInProgress,

    /// The selected input file has an unsupported extension.
    #[error("Unsupported input file: {0}")]
    UnsupportedInput(PathBuf),

    /// The selected input file could not be read.
    #[error("Failed to read input {path}: {source}")]
    InputRead {
        /// Path of the input file.
        path: PathBuf,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Conversion rejected before start (e.g. empty input).
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Playback command failed.
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// Persisted-state I/O failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_error_serializes_with_category() {
        let err = ConversionError::synthesis(3, "engine busy");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("synthesis") || json.contains("Synthesis"));
        let parsed: ConversionError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }

    #[test]
    fn cancelled_is_not_a_failure() {
        assert!(ConversionError::Cancelled.is_cancelled());
        assert!(!ConversionError::EmptyInput.is_cancelled());
    }

    #[test]
    fn io_error_captures_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ConversionError::from(io);
        match err {
            ConversionError::Io { kind, message } => {
                assert_eq!(kind, "NotFound");
                assert!(message.contains("gone"));
            }
            other => panic!("expected Io, got {other:?}"),
        }
    }
}
