//! Intermediate clip files.
//!
//! Each synthesized chunk is written to `chunk_{i}.wav` in the job's clip
//! directory, then read back and deleted during assembly. Keeping clips on
//! disk bounds memory to one chunk at a time during synthesis.

use std::fs;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use lector_core::{CLIP_BITS_PER_SAMPLE, CLIP_CHANNELS, CLIP_SAMPLE_RATE, ConversionError, SpeechClip};

/// WAV spec shared by every intermediate clip.
#[must_use]
pub fn clip_spec() -> WavSpec {
    WavSpec {
        channels: CLIP_CHANNELS,
        sample_rate: CLIP_SAMPLE_RATE,
        bits_per_sample: CLIP_BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// Path of clip `index` inside `dir`.
#[must_use]
pub fn clip_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("chunk_{index}.wav"))
}

/// Write one clip to its slot in `dir`.
pub fn write_clip(dir: &Path, index: usize, clip: &SpeechClip) -> Result<PathBuf, ConversionError> {
    let path = clip_path(dir, index);
    let mut writer = WavWriter::create(&path, clip_spec())
        .map_err(|e| ConversionError::export(format!("create {}: {e}", path.display())))?;
    for &sample in &clip.samples {
        writer
            .write_sample(sample)
            .map_err(|e| ConversionError::export(format!("write {}: {e}", path.display())))?;
    }
    writer
        .finalize()
        .map_err(|e| ConversionError::export(format!("finalize {}: {e}", path.display())))?;
    Ok(path)
}

/// Read a clip back from disk.
pub fn read_clip(path: &Path) -> Result<SpeechClip, ConversionError> {
    let mut reader = WavReader::open(path)
        .map_err(|e| ConversionError::export(format!("open {}: {e}", path.display())))?;
    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConversionError::export(format!("decode {}: {e}", path.display())))?;
    Ok(SpeechClip::new(samples))
}

/// Delete a clip file. Missing files are fine; cleanup must be idempotent.
pub fn remove_clip(path: &Path) -> Result<(), ConversionError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConversionError::from_io_error(&e)),
    }
}
