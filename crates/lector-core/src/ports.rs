//! Ports - trait seams between the domain and its adapters.
//!
//! The synthesis engine, the audio output device, and the metadata probe
//! are all external collaborators. The pipeline and playback crates ship
//! production adapters; tests substitute scripted implementations.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{CLIP_SAMPLE_RATE, SpeechClip};
use crate::error::{ConversionError, PlaybackError};

/// Speech synthesis engine.
///
/// One call per text chunk. Implementations must be safe to call from a
/// background task; the conversion job holds the synthesizer for its whole
/// run and calls it sequentially.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render one chunk of text to PCM.
    ///
    /// `length_scale` stretches phoneme durations: 1.0 is the voice's
    /// natural pace, larger is slower.
    async fn synthesize(&self, text: &str, length_scale: f32)
    -> Result<SpeechClip, ConversionError>;
}

/// Audio output device owned exclusively by the playback engine.
///
/// All methods are synchronous; the engine never calls them concurrently.
pub trait AudioDevice: Send {
    /// Bind a track file for playback. Replaces any previously loaded track.
    fn load(&mut self, path: &Path) -> Result<(), PlaybackError>;

    /// Start playing the loaded track from an offset into it.
    fn play(&mut self, start_offset: Duration) -> Result<(), PlaybackError>;

    /// Suspend output, retaining the stream position.
    fn pause(&mut self);

    /// Resume suspended output.
    fn unpause(&mut self);

    /// Stop output and release the stream.
    fn stop(&mut self);

    /// Whether the device is still producing (or would produce) output.
    /// `false` once the track has played to its natural end.
    fn is_busy(&self) -> bool;

    /// Milliseconds of audio played since the last `play` or `unpause`,
    /// as reported by the device itself.
    fn elapsed_millis(&self) -> u64;
}

/// Reads a track's duration from its metadata.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration of the track in seconds.
    async fn duration_seconds(&self, path: &Path) -> Result<f64, PlaybackError>;
}

/// Synthesizer stand-in that renders every chunk as silence.
///
/// Useful on hosts without a speech engine: the pipeline still produces a
/// playable track with correct chunk boundaries and timing behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilenceSynthesizer {
    /// Seconds of silence rendered per 100 input characters.
    pub seconds_per_100_chars: f64,
}

impl SilenceSynthesizer {
    /// Stand-in pacing approximating a slow read-aloud rate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            seconds_per_100_chars: 0.5,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for SilenceSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        length_scale: f32,
    ) -> Result<SpeechClip, ConversionError> {
        let seconds =
            self.seconds_per_100_chars * (text.len() as f64 / 100.0) * f64::from(length_scale);
        let samples = (seconds * f64::from(CLIP_SAMPLE_RATE)).round() as usize;
        Ok(SpeechClip::new(vec![0i16; samples.max(1)]))
    }
}
