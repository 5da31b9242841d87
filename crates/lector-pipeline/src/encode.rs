//! MP3 export via LAME.
//!
//! Output is always constant-bitrate 128 kbps mono at the clip sample rate,
//! so every exported audiobook seeks predictably. The two `unsafe` blocks
//! are the encoder's buffer contract: `encode`/`flush` report how many bytes
//! they wrote into the spare capacity, and `set_len` commits exactly that.

use std::fs;
use std::path::Path;

use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, MonoPcm, Quality};

use lector_core::{CLIP_SAMPLE_RATE, ConversionError};

/// Fixed export bitrate in kbps.
pub const EXPORT_BITRATE_KBPS: u32 = 128;

/// Encode mono PCM to an MP3 file at the fixed bitrate.
pub fn encode_mp3(pcm: &[i16], output: &Path) -> Result<(), ConversionError> {
    let bytes = encode_to_vec(pcm)?;
    fs::write(output, &bytes)
        .map_err(|e| ConversionError::export(format!("write {}: {e}", output.display())))?;
    Ok(())
}

fn encode_to_vec(pcm: &[i16]) -> Result<Vec<u8>, ConversionError> {
    let lame = |e: &dyn std::fmt::Display| ConversionError::export(format!("lame: {e}"));

    let mut builder = Builder::new().ok_or_else(|| ConversionError::export("lame: init failed"))?;
    builder.set_num_channels(1).map_err(|e| lame(&e))?;
    builder.set_sample_rate(CLIP_SAMPLE_RATE).map_err(|e| lame(&e))?;
    builder.set_brate(Bitrate::Kbps128).map_err(|e| lame(&e))?;
    builder.set_quality(Quality::Good).map_err(|e| lame(&e))?;
    let mut encoder = builder.build().map_err(|e| lame(&e))?;

    let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(pcm.len()));
    let written = encoder
        .encode(MonoPcm(pcm), out.spare_capacity_mut())
        .map_err(|e| lame(&e))?;
    #[allow(unsafe_code)]
    // SAFETY: encode initialized exactly `written` bytes of spare capacity.
    unsafe {
        out.set_len(out.len() + written);
    }

    let flushed = encoder
        .flush::<FlushNoGap>(out.spare_capacity_mut())
        .map_err(|e| lame(&e))?;
    #[allow(unsafe_code)]
    // SAFETY: flush initialized exactly `flushed` bytes of spare capacity.
    unsafe {
        out.set_len(out.len() + flushed);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_one_second_of_silence() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.mp3");
        let pcm = vec![0i16; CLIP_SAMPLE_RATE as usize];
        encode_mp3(&pcm, &out).unwrap();
        let bytes = fs::read(&out).unwrap();
        // 1s at 128 kbps is roughly 16 KiB of frames.
        assert!(bytes.len() > 4_000, "suspiciously small mp3: {}", bytes.len());
    }

    #[test]
    fn write_failure_is_an_export_error() {
        let err = encode_mp3(&[0i16; 64], Path::new("/nonexistent-dir/out.mp3")).unwrap_err();
        assert!(matches!(err, ConversionError::Export { .. }));
    }
}
