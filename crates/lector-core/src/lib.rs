//! Core domain types and port definitions for lector.
//!
//! This crate is pure domain logic: no audio hardware, no codecs, no I/O
//! beyond the persisted-state file. The conversion pipeline and playback
//! adapters live in their own crates and depend on the ports defined here.

pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod segment;
pub mod store;
pub mod voices;

// Re-export commonly used types for convenience
pub use domain::{
    AudioTrack, CLIP_BITS_PER_SAMPLE, CLIP_CHANNELS, CLIP_SAMPLE_RATE, ConversionStage,
    InputKind, PlayState, PlaybackSnapshot, SpeechClip, format_time,
};
pub use error::{ConversionError, PlaybackError, SessionError, StoreError};
pub use events::SessionEvent;
pub use ports::{AudioDevice, DurationProbe, SilenceSynthesizer, SpeechSynthesizer};
pub use segment::{DEFAULT_BASE_SIZE, DEFAULT_MAX_EXTRA, segment, segment_with};
pub use store::{PersistedState, StateStore};
pub use voices::{CATALOG, DEFAULT_VOICE, Voice, VoiceQuality};
