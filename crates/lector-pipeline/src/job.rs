//! The background conversion job.
//!
//! One job turns one text source into one MP3: segment, synthesize each
//! chunk to a clip file, fold clips in order, export. The job runs on a
//! spawned task and reports through the session event channel; the caller
//! keeps a [`ConversionHandle`] to cancel it or await its end.
//!
//! All events for a job are posted from its single task, so the channel's
//! FIFO order is the delivery order and the terminal event is always last.
//! Cancellation is cooperative: the token is checked between chunks and
//! between folds, never mid-synthesis.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use lector_core::{
    AudioTrack, ConversionError, ConversionStage, SessionEvent, SpeechSynthesizer, segment,
};

use crate::{assemble, clips, encode};

/// Everything a conversion job needs to run.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// The source text.
    pub text: String,
    /// Where the MP3 lands.
    pub output_path: PathBuf,
    /// Synthesis pace multiplier; 1.0 is the voice's natural pace.
    pub length_scale: f32,
}

impl ConversionRequest {
    /// Request at natural pace.
    pub fn new(text: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            output_path: output_path.into(),
            length_scale: 1.0,
        }
    }
}

/// Handle to a running conversion job.
#[derive(Debug)]
pub struct ConversionHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl ConversionHandle {
    /// Request cooperative cancellation. Returns immediately; the job
    /// acknowledges at its next checkpoint and posts `ConversionCancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the job's task has finished (its terminal event is posted).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the job's task to finish.
    pub async fn wait(self) {
        let _ = self.join.await;
    }
}

/// Validate a request and spawn its job.
///
/// Empty or whitespace-only text is rejected here, synchronously, before
/// any task exists; no events are emitted for a rejected request.
pub fn spawn(
    synthesizer: Arc<dyn SpeechSynthesizer>,
    request: ConversionRequest,
    events: UnboundedSender<SessionEvent>,
) -> Result<ConversionHandle, ConversionError> {
    let chunks = segment(&request.text);
    if chunks.is_empty() {
        return Err(ConversionError::EmptyInput);
    }

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let join = tokio::spawn(async move {
        let total = chunks.len();
        let output = request.output_path.clone();
        let result = run_job(synthesizer, chunks, request, &token, &events).await;
        let terminal = match result {
            Ok(track) => {
                info!(output = %output.display(), "conversion completed");
                SessionEvent::completed(track)
            }
            Err(err) if err.is_cancelled() => {
                info!(output = %output.display(), "conversion cancelled");
                SessionEvent::ConversionCancelled
            }
            Err(err) => {
                warn!(error = %err, chunks = total, "conversion failed");
                SessionEvent::failed(err.to_string())
            }
        };
        let _ = events.send(terminal);
    });

    Ok(ConversionHandle { cancel, join })
}

async fn run_job(
    synthesizer: Arc<dyn SpeechSynthesizer>,
    chunks: Vec<String>,
    request: ConversionRequest,
    cancel: &CancellationToken,
    events: &UnboundedSender<SessionEvent>,
) -> Result<AudioTrack, ConversionError> {
    let total = chunks.len();
    info!(chunks = total, output = %request.output_path.display(), "conversion started");
    let _ = events.send(SessionEvent::started(total));

    let clip_dir = clip_dir_for(&request.output_path);
    std::fs::create_dir_all(&clip_dir)?;

    let result = run_stages(&synthesizer, &chunks, &request, &clip_dir, cancel, events).await;
    assemble::cleanup_partial(&clip_dir, total, &request.output_path, result.is_ok());
    result
}

async fn run_stages(
    synthesizer: &Arc<dyn SpeechSynthesizer>,
    chunks: &[String],
    request: &ConversionRequest,
    clip_dir: &std::path::Path,
    cancel: &CancellationToken,
    events: &UnboundedSender<SessionEvent>,
) -> Result<AudioTrack, ConversionError> {
    let total = chunks.len();

    for (index, chunk) in chunks.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(ConversionError::Cancelled);
        }
        let clip = synthesizer.synthesize(chunk, request.length_scale).await?;
        clips::write_clip(clip_dir, index, &clip)?;
        let _ = events.send(SessionEvent::progress(
            index + 1,
            total,
            ConversionStage::Synthesizing,
        ));
    }

    let pcm = assemble::fold_clips(clip_dir, total, cancel, |folded| {
        let _ = events.send(SessionEvent::progress(
            folded,
            total,
            ConversionStage::Combining,
        ));
    })?;

    let output = request.output_path.clone();
    let encode_result = tokio::task::spawn_blocking(move || {
        encode::encode_mp3(&pcm, &output).map(|()| output)
    })
    .await
    .map_err(|e| ConversionError::export(format!("encoder task: {e}")))?;

    let output = encode_result?;
    Ok(AudioTrack::mp3(output, encode::EXPORT_BITRATE_KBPS))
}

/// Clip directory for an output path: a hidden sibling of the output file.
fn clip_dir_for(output: &std::path::Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    output.with_file_name(format!(".{stem}.clips"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_dir_is_a_hidden_sibling() {
        let dir = clip_dir_for(std::path::Path::new("/books/novel.mp3"));
        assert_eq!(dir, PathBuf::from("/books/.novel.clips"));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_spawn() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let synth: Arc<dyn SpeechSynthesizer> = Arc::new(lector_core::SilenceSynthesizer::new());
        let err = spawn(synth, ConversionRequest::new("   \n  ", "/tmp/x.mp3"), tx).unwrap_err();
        assert_eq!(err, ConversionError::EmptyInput);
        assert!(rx.try_recv().is_err());
    }
}
