//! The session controller.
//!
//! Single owner of the whole session: routes selected inputs to either the
//! conversion pipeline (text) or straight to the playback engine (audio),
//! enforces the one-job-at-a-time rule, pumps the event channel, and
//! persists the resume state after every command that moves the track or
//! the position.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{info, warn};

use lector_core::{
    AudioDevice, DurationProbe, InputKind, PersistedState, PlaybackSnapshot, SessionError,
    SessionEvent, SpeechSynthesizer, StateStore,
};
use lector_pipeline::{ConversionHandle, ConversionRequest};
use lector_playback::PlaybackEngine;

/// Step size of the relative skip commands, in seconds.
pub const SKIP_STEP_SECONDS: f64 = 10.0;

/// Owns the session. Commands are serialized through `&mut self`; the
/// background contexts only ever talk back through the event channel.
pub struct SessionController {
    engine: Arc<PlaybackEngine>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    probe: Arc<dyn DurationProbe>,
    store: StateStore,
    state: PersistedState,
    conversion: Option<ConversionHandle>,
    length_scale: f32,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
}

impl SessionController {
    /// Build a controller and restore the previous session from the store.
    ///
    /// A persisted track that no longer exists on disk is dropped from the
    /// state; the last folder survives either way.
    pub fn new(
        device: Box<dyn AudioDevice>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        probe: Arc<dyn DurationProbe>,
        store: StateStore,
    ) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        let engine = Arc::new(PlaybackEngine::new(device, events_tx.clone()));
        let mut state = store.load_or_default();

        if let Some(path) = state.audio_file.clone() {
            if path.is_file() {
                info!(track = %path.display(), position = state.position, "restoring session");
                engine.bind(&path, state.position);
                spawn_probe(&probe, &engine, path);
            } else {
                warn!(track = %path.display(), "persisted track is gone, dropping it");
                state.audio_file = None;
            }
        }

        Self {
            engine,
            synthesizer,
            probe,
            store,
            state,
            conversion: None,
            length_scale: 1.0,
            events_tx,
            events_rx,
        }
    }

    /// The playback engine, mostly for status display and tests.
    #[must_use]
    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    /// Folder the user last selected an input from.
    #[must_use]
    pub fn last_folder(&self) -> &Path {
        &self.state.last_folder
    }

    /// Synthesis pace multiplier for future conversions.
    pub fn set_length_scale(&mut self, scale: f32) {
        self.length_scale = scale.max(0.1);
    }

    /// Whether a conversion job is still running.
    #[must_use]
    pub fn is_converting(&self) -> bool {
        self.conversion.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Route a selected input file.
    ///
    /// `.txt` starts a conversion job whose MP3 lands next to the input;
    /// `.wav`/`.mp3` binds the file for playback directly. Anything else
    /// is rejected. At most one conversion runs at a time.
    pub fn select_input(&mut self, path: &Path) -> Result<(), SessionError> {
        let kind = InputKind::from_path(path)
            .ok_or_else(|| SessionError::UnsupportedInput(path.to_path_buf()))?;

        if let Some(folder) = path.parent() {
            if !folder.as_os_str().is_empty() {
                self.state.last_folder = folder.to_path_buf();
            }
        }

        match kind {
            InputKind::Text => self.start_conversion(path),
            InputKind::Audio => {
                self.bind_track(path.to_path_buf(), 0.0);
                self.persist();
                Ok(())
            }
        }
    }

    fn start_conversion(&mut self, input: &Path) -> Result<(), SessionError> {
        if self.is_converting() {
            return Err(SessionError::ConversionInProgress);
        }
        let text = std::fs::read_to_string(input).map_err(|source| SessionError::InputRead {
            path: input.to_path_buf(),
            source,
        })?;
        let output = input.with_extension("mp3");
        let mut request = ConversionRequest::new(text, output);
        request.length_scale = self.length_scale;
        let handle = lector_pipeline::spawn(
            Arc::clone(&self.synthesizer),
            request,
            self.events_tx.clone(),
        )?;
        self.conversion = Some(handle);
        self.persist();
        Ok(())
    }

    /// Request cancellation of the running conversion, if any.
    pub fn cancel_conversion(&mut self) {
        if let Some(handle) = &self.conversion {
            if !handle.is_finished() {
                info!("cancelling conversion");
                handle.cancel();
            }
        }
    }

    /// Start or restart playback from the current position.
    pub fn play(&mut self) -> Result<(), SessionError> {
        self.engine.play()?;
        self.sync_and_persist();
        Ok(())
    }

    /// Pause playback.
    pub fn pause(&mut self) {
        self.engine.pause();
        self.sync_and_persist();
    }

    /// Resume paused playback.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.engine.resume()?;
        Ok(())
    }

    /// Stop playback and rewind to the start.
    pub fn stop(&mut self) {
        self.engine.stop();
        self.sync_and_persist();
    }

    /// Seek to an absolute position in seconds.
    pub fn seek(&mut self, seconds: f64) -> Result<(), SessionError> {
        self.engine.seek(seconds)?;
        self.sync_and_persist();
        Ok(())
    }

    /// Skip forward by the fixed step.
    pub fn skip_forward(&mut self) -> Result<(), SessionError> {
        self.skip(SKIP_STEP_SECONDS)
    }

    /// Skip backward by the fixed step.
    pub fn skip_back(&mut self) -> Result<(), SessionError> {
        self.skip(-SKIP_STEP_SECONDS)
    }

    fn skip(&mut self, delta: f64) -> Result<(), SessionError> {
        self.engine.skip(delta)?;
        self.sync_and_persist();
        Ok(())
    }

    /// Current playback snapshot.
    #[must_use]
    pub fn status(&self) -> PlaybackSnapshot {
        self.engine.snapshot()
    }

    /// Drain pending events, applying their side effects, and hand them to
    /// the caller for display.
    ///
    /// A completed conversion binds its track at position zero and kicks
    /// off the duration probe. Position reports update the in-memory
    /// resume state; they are only flushed to disk by commands and
    /// [`save_now`](Self::save_now).
    pub fn poll_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(&event);
            events.push(event);
        }
        events
    }

    fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::ConversionCompleted { track } => {
                self.conversion = None;
                self.bind_track(track.path.clone(), 0.0);
                self.persist();
            }
            SessionEvent::ConversionCancelled | SessionEvent::ConversionFailed { .. } => {
                self.conversion = None;
            }
            SessionEvent::PositionChanged { seconds } => {
                self.state.position = *seconds;
            }
            _ => {}
        }
    }

    /// Flush the resume state to disk. Called by the CLI on exit.
    pub fn save_now(&mut self) {
        self.sync_and_persist();
    }

    fn bind_track(&mut self, path: PathBuf, position: f64) {
        self.engine.bind(&path, position);
        self.state.audio_file = Some(path.clone());
        self.state.position = position;
        spawn_probe(&self.probe, &self.engine, path);
    }

    fn sync_and_persist(&mut self) {
        self.state.position = self.engine.snapshot().position;
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.state) {
            warn!(error = %err, "failed to persist session state");
        }
    }
}

fn spawn_probe(probe: &Arc<dyn DurationProbe>, engine: &Arc<PlaybackEngine>, path: PathBuf) {
    let probe = Arc::clone(probe);
    let engine = Arc::clone(engine);
    tokio::spawn(async move {
        match probe.duration_seconds(&path).await {
            Ok(seconds) => engine.set_duration(seconds),
            Err(err) => warn!(track = %path.display(), error = %err, "duration probe failed"),
        }
    });
}
