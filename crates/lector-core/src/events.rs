//! Session events - discriminated union for all state changes the UI layer
//! consumes.
//!
//! Background contexts (the conversion job, the duration probe, the playback
//! tracking loop) post these onto a thread-safe channel; the UI context
//! drains the channel on its own schedule. For one conversion job all events
//! are generated from a single task, so channel FIFO order is delivery
//! order, and the terminal event (`ConversionCompleted` / `Cancelled` /
//! `Failed`) is always the last one for that job.

use serde::{Deserialize, Serialize};

use crate::domain::{AudioTrack, ConversionStage, PlayState};

/// Single discriminated union for all session events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A conversion job has started.
    ConversionStarted {
        /// Number of chunks the source text was segmented into.
        chunks: usize,
    },

    /// Progress update for the running conversion job.
    ConversionProgress {
        /// 1-based index of the chunk just processed.
        current: usize,
        /// Total number of chunks.
        total: usize,
        /// Which pipeline stage the report refers to.
        stage: ConversionStage,
    },

    /// Conversion completed successfully. Terminal.
    ConversionCompleted {
        /// The exported track.
        track: AudioTrack,
    },

    /// Conversion was cancelled by the user. Terminal, no track produced.
    ConversionCancelled,

    /// Conversion failed. Terminal, partial artifacts cleaned up.
    ConversionFailed {
        /// Human-readable error description.
        error: String,
    },

    /// The asynchronous metadata probe computed the bound track's duration.
    DurationComputed {
        /// Duration in seconds.
        seconds: f64,
    },

    /// The tracking loop observed a new playback position.
    PositionChanged {
        /// Position in seconds.
        seconds: f64,
    },

    /// The playback engine changed state.
    PlayStateChanged {
        /// The new state.
        state: PlayState,
    },

    /// A track was bound as the active playback target.
    TrackBound {
        /// Path of the bound track file.
        path: std::path::PathBuf,
    },
}

impl SessionEvent {
    /// Create a conversion-started event.
    #[must_use]
    pub const fn started(chunks: usize) -> Self {
        Self::ConversionStarted { chunks }
    }

    /// Create a progress event.
    #[must_use]
    pub const fn progress(current: usize, total: usize, stage: ConversionStage) -> Self {
        Self::ConversionProgress {
            current,
            total,
            stage,
        }
    }

    /// Create a completed event.
    #[must_use]
    pub const fn completed(track: AudioTrack) -> Self {
        Self::ConversionCompleted { track }
    }

    /// Create a failed event.
    pub fn failed(error: impl Into<String>) -> Self {
        Self::ConversionFailed {
            error: error.into(),
        }
    }

    /// Create a position-changed event.
    #[must_use]
    pub const fn position(seconds: f64) -> Self {
        Self::PositionChanged { seconds }
    }

    /// Whether this event terminates a conversion job.
    #[must_use]
    pub const fn is_conversion_terminal(&self) -> bool {
        matches!(
            self,
            Self::ConversionCompleted { .. }
                | Self::ConversionCancelled
                | Self::ConversionFailed { .. }
        )
    }

    /// Get the event name for wire protocols and log lines.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::ConversionStarted { .. } => "conversion:started",
            Self::ConversionProgress { .. } => "conversion:progress",
            Self::ConversionCompleted { .. } => "conversion:completed",
            Self::ConversionCancelled => "conversion:cancelled",
            Self::ConversionFailed { .. } => "conversion:failed",
            Self::DurationComputed { .. } => "playback:duration",
            Self::PositionChanged { .. } => "playback:position",
            Self::PlayStateChanged { .. } => "playback:state",
            Self::TrackBound { .. } => "session:track_bound",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_events_are_flagged() {
        assert!(SessionEvent::ConversionCancelled.is_conversion_terminal());
        assert!(SessionEvent::failed("boom").is_conversion_terminal());
        assert!(!SessionEvent::started(3).is_conversion_terminal());
        assert!(!SessionEvent::position(1.0).is_conversion_terminal());
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let ev = SessionEvent::progress(2, 5, ConversionStage::Synthesizing);
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"conversion_progress\""));
        assert!(json.contains("\"stage\":\"synthesizing\""));
    }

    #[test]
    fn event_names_are_stable() {
        assert_eq!(SessionEvent::started(1).event_name(), "conversion:started");
        assert_eq!(
            SessionEvent::DurationComputed { seconds: 1.0 }.event_name(),
            "playback:duration"
        );
    }
}
