//! Core domain types for conversion and playback.
//!
//! Pure data types with no I/O dependencies.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sample rate of every synthesized clip, in Hz.
pub const CLIP_SAMPLE_RATE: u32 = 22_050;

/// Bit depth of every synthesized clip.
pub const CLIP_BITS_PER_SAMPLE: u16 = 16;

/// Channel count of every synthesized clip (mono).
pub const CLIP_CHANNELS: u16 = 1;

/// PCM audio produced by one synthesis call.
///
/// Always mono, 16-bit, [`CLIP_SAMPLE_RATE`] Hz. The clip is owned by the
/// conversion job until the assembler folds it into the output track.
#[derive(Debug, Clone, Default)]
pub struct SpeechClip {
    /// PCM i16 samples.
    pub samples: Vec<i16>,
}

impl SpeechClip {
    /// Create a clip from raw samples.
    #[must_use]
    pub const fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    /// Duration of the clip at the fixed sample rate.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(CLIP_SAMPLE_RATE))
    }

    /// Whether the clip contains no audio at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// The final exported audio artifact. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Path of the exported file.
    pub path: PathBuf,
    /// Container/codec label (currently always `"mp3"`).
    pub format: String,
    /// Constant bitrate in kbps.
    pub bitrate_kbps: u32,
}

impl AudioTrack {
    /// Create a track handle for an MP3 exported at the fixed bitrate.
    pub fn mp3(path: impl Into<PathBuf>, bitrate_kbps: u32) -> Self {
        Self {
            path: path.into(),
            format: "mp3".to_string(),
            bitrate_kbps,
        }
    }
}

/// Stage of the conversion pipeline a progress report refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStage {
    /// Per-chunk speech synthesis.
    Synthesizing,
    /// Folding clips into the output track.
    Combining,
}

/// Playback state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    /// No output; position may still hold a resume offset.
    #[default]
    Stopped,
    /// Device is producing output.
    Playing,
    /// Output suspended; position retained.
    Paused,
}

/// Read-only snapshot of the playback session, safe to hand across threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// The bound track file, if any.
    pub track: Option<PathBuf>,
    /// Current position in seconds.
    pub position: f64,
    /// Track duration in seconds, once the metadata probe has reported it.
    pub duration: Option<f64>,
    /// Current play state.
    pub state: PlayState,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            track: None,
            position: 0.0,
            duration: None,
            state: PlayState::Stopped,
        }
    }
}

/// Kind of input file a user selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Plain text — goes through the conversion pipeline.
    Text,
    /// Pre-rendered audio — bound directly for playback.
    Audio,
}

impl InputKind {
    /// Classify a path by extension. Returns `None` for unsupported kinds.
    #[must_use]
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("txt") => Some(Self::Text),
            Some(ext)
                if ext.eq_ignore_ascii_case("wav") || ext.eq_ignore_ascii_case("mp3") =>
            {
                Some(Self::Audio)
            }
            _ => None,
        }
    }
}

/// Format whole seconds as `HH:MM:SS` for status display.
#[must_use]
pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}
