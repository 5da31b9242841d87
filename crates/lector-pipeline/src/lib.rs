//! Text-to-audiobook conversion pipeline.
//!
//! Turns segmented text into a single constant-bitrate MP3 through three
//! stages: per-chunk speech synthesis to intermediate WAV clips, ordered
//! assembly of clips into one PCM buffer, and LAME export. Jobs run on a
//! background task, report over the session event channel, and cancel
//! cooperatively.

pub mod assemble;
pub mod clips;
pub mod encode;
pub mod job;

pub use encode::EXPORT_BITRATE_KBPS;
pub use job::{ConversionHandle, ConversionRequest, spawn};
