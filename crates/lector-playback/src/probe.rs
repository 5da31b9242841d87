//! Track duration probe backed by symphonia.
//!
//! Prefers the frame count declared in the codec parameters; falls back to
//! summing packet durations when the container does not declare one (plain
//! CBR MP3s without a Xing header, for instance).

use std::fs::File;
use std::path::Path;

use async_trait::async_trait;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use lector_core::{DurationProbe, PlaybackError};

/// Reads durations with symphonia's format probe on a blocking task.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaProbe;

#[async_trait]
impl DurationProbe for SymphoniaProbe {
    async fn duration_seconds(&self, path: &Path) -> Result<f64, PlaybackError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || probe_duration(&path))
            .await
            .map_err(|e| PlaybackError::metadata(format!("probe task: {e}")))?
    }
}

fn probe_duration(path: &Path) -> Result<f64, PlaybackError> {
    let file = File::open(path).map_err(|_| PlaybackError::UnreadableTrack(path.to_path_buf()))?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PlaybackError::metadata(format!("{}: {e}", path.display())))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| PlaybackError::metadata(format!("{}: no audio track", path.display())))?;
    let track_id = track.id;
    let params = track.codec_params.clone();
    let time_base = params
        .time_base
        .ok_or_else(|| PlaybackError::metadata(format!("{}: no time base", path.display())))?;

    if let Some(n_frames) = params.n_frames {
        let time = time_base.calc_time(n_frames);
        let seconds = time.seconds as f64 + time.frac;
        debug!(path = %path.display(), seconds, "duration from declared frame count");
        return Ok(seconds);
    }

    // No declared length; walk the packets.
    let mut total_ts: u64 = 0;
    while let Ok(packet) = format.next_packet() {
        if packet.track_id() == track_id {
            total_ts += packet.dur();
        }
    }
    let time = time_base.calc_time(total_ts);
    let seconds = time.seconds as f64 + time.frac;
    debug!(path = %path.display(), seconds, "duration from packet sum");
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, seconds: f64) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let samples = (seconds * 22_050.0).round() as usize;
        for _ in 0..samples {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[tokio::test]
    async fn probes_wav_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_wav(&path, 2.5);
        let seconds = SymphoniaProbe.duration_seconds(&path).await.unwrap();
        assert!((seconds - 2.5).abs() < 0.05, "got {seconds}");
    }

    #[tokio::test]
    async fn missing_file_is_unreadable() {
        let err = SymphoniaProbe
            .duration_seconds(Path::new("/no/such/file.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::UnreadableTrack(_)));
    }
}
