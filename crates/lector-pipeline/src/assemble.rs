//! Clip assembly.
//!
//! Folds the job's clip files into one PCM buffer in chunk order. Each clip
//! is deleted as soon as it has been folded, so disk usage shrinks as the
//! fold advances. Cancellation is honored between folds; a fold in progress
//! always completes.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use lector_core::ConversionError;

use crate::clips;

/// Fold `total` clips from `dir` into a single sample buffer.
///
/// Calls `on_folded` with the 1-based index after each fold. Clips that
/// decode to zero samples are skipped with a warning; they produce no
/// audible gap and must not abort the job.
pub fn fold_clips(
    dir: &Path,
    total: usize,
    cancel: &CancellationToken,
    mut on_folded: impl FnMut(usize),
) -> Result<Vec<i16>, ConversionError> {
    let mut pcm = Vec::new();
    for index in 0..total {
        if cancel.is_cancelled() {
            return Err(ConversionError::Cancelled);
        }
        let path = clips::clip_path(dir, index);
        let clip = clips::read_clip(&path)?;
        if clip.is_empty() {
            warn!(index, "skipping empty clip");
        } else {
            pcm.extend_from_slice(&clip.samples);
        }
        clips::remove_clip(&path)?;
        on_folded(index + 1);
    }
    Ok(pcm)
}

/// Remove every artifact a partially-run job may have left behind: any
/// remaining clip files, the clip directory, and the partial output file.
/// Idempotent; called on cancel, on failure, and after success.
pub fn cleanup_partial(dir: &Path, total: usize, output: &Path, keep_output: bool) {
    for index in 0..total {
        if let Err(err) = clips::remove_clip(&clips::clip_path(dir, index)) {
            warn!(index, error = %err, "failed to remove clip during cleanup");
        }
    }
    if let Err(err) = std::fs::remove_dir(dir) {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(dir = %dir.display(), error = %err, "failed to remove clip directory");
        }
    }
    if !keep_output {
        if let Err(err) = std::fs::remove_file(output) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(output = %output.display(), error = %err, "failed to remove partial output");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lector_core::SpeechClip;

    #[test]
    fn folds_in_order_and_deletes_clips() {
        let dir = tempfile::tempdir().unwrap();
        clips::write_clip(dir.path(), 0, &SpeechClip::new(vec![1, 2])).unwrap();
        clips::write_clip(dir.path(), 1, &SpeechClip::new(vec![3])).unwrap();
        clips::write_clip(dir.path(), 2, &SpeechClip::new(vec![4, 5])).unwrap();

        let mut seen = Vec::new();
        let token = CancellationToken::new();
        let pcm = fold_clips(dir.path(), 3, &token, |i| seen.push(i)).unwrap();

        assert_eq!(pcm, vec![1, 2, 3, 4, 5]);
        assert_eq!(seen, vec![1, 2, 3]);
        for i in 0..3 {
            assert!(!clips::clip_path(dir.path(), i).exists());
        }
    }

    #[test]
    fn empty_clips_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        clips::write_clip(dir.path(), 0, &SpeechClip::new(vec![7])).unwrap();
        clips::write_clip(dir.path(), 1, &SpeechClip::new(vec![])).unwrap();
        clips::write_clip(dir.path(), 2, &SpeechClip::new(vec![8])).unwrap();

        let token = CancellationToken::new();
        let pcm = fold_clips(dir.path(), 3, &token, |_| {}).unwrap();
        assert_eq!(pcm, vec![7, 8]);
    }

    #[test]
    fn cancellation_stops_between_folds() {
        let dir = tempfile::tempdir().unwrap();
        clips::write_clip(dir.path(), 0, &SpeechClip::new(vec![1])).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let err = fold_clips(dir.path(), 1, &token, |_| {}).unwrap_err();
        assert!(err.is_cancelled());
        // The clip survives; cleanup is the caller's job.
        assert!(clips::clip_path(dir.path(), 0).exists());
    }

    #[test]
    fn cleanup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let clip_dir = dir.path().join("clips");
        std::fs::create_dir(&clip_dir).unwrap();
        clips::write_clip(&clip_dir, 0, &SpeechClip::new(vec![1])).unwrap();
        let output = dir.path().join("out.mp3");
        std::fs::write(&output, b"partial").unwrap();

        cleanup_partial(&clip_dir, 1, &output, false);
        assert!(!clip_dir.exists());
        assert!(!output.exists());
        cleanup_partial(&clip_dir, 1, &output, false);
    }
}
