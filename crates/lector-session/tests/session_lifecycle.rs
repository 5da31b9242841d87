//! Controller lifecycle: startup restore, input routing, one-job rule,
//! and resume-state persistence.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use lector_core::{
    ConversionError, DurationProbe, PersistedState, PlaybackError, SessionError, SessionEvent,
    SilenceSynthesizer, SpeechClip, SpeechSynthesizer, StateStore,
};
use lector_playback::testing::{DeviceScript, ScriptedDevice};
use lector_session::SessionController;

struct FixedProbe(f64);

#[async_trait]
impl DurationProbe for FixedProbe {
    async fn duration_seconds(&self, _path: &Path) -> Result<f64, PlaybackError> {
        Ok(self.0)
    }
}

/// Sleeps long enough per chunk for tests to act mid-job.
struct SlowSynth;

#[async_trait]
impl SpeechSynthesizer for SlowSynth {
    async fn synthesize(
        &self,
        _text: &str,
        _length_scale: f32,
    ) -> Result<SpeechClip, ConversionError> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(SpeechClip::new(vec![1i16; 100]))
    }
}

fn controller_with(
    store: StateStore,
    synthesizer: Arc<dyn SpeechSynthesizer>,
) -> (SessionController, DeviceScript) {
    let (device, script) = ScriptedDevice::new();
    let controller = SessionController::new(
        Box::new(device),
        synthesizer,
        Arc::new(FixedProbe(300.0)),
        store,
    );
    (controller, script)
}

async fn wait_for_terminal(controller: &mut SessionController) -> SessionEvent {
    for _ in 0..1000 {
        for event in controller.poll_events() {
            if event.is_conversion_terminal() {
                return event;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("conversion never reached a terminal event");
}

fn saved_state(store_path: &Path) -> PersistedState {
    serde_json::from_str(&std::fs::read_to_string(store_path).unwrap()).unwrap()
}

#[tokio::test]
async fn startup_restores_track_position_and_probes_duration() {
    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("book.mp3");
    std::fs::write(&track, b"mp3").unwrap();

    let store_path = dir.path().join("state.json");
    StateStore::at(&store_path)
        .save(&PersistedState {
            audio_file: Some(track.clone()),
            position: 45.5,
            last_folder: dir.path().to_path_buf(),
        })
        .unwrap();

    let (controller, _script) =
        controller_with(StateStore::at(&store_path), Arc::new(SilenceSynthesizer::new()));

    let status = controller.status();
    assert_eq!(status.track, Some(track));
    assert_eq!(status.position, 45.5);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(controller.status().duration, Some(300.0));
}

#[tokio::test]
async fn startup_drops_a_vanished_track_but_keeps_the_folder() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("state.json");
    StateStore::at(&store_path)
        .save(&PersistedState {
            audio_file: Some(PathBuf::from("/gone/away.mp3")),
            position: 99.0,
            last_folder: PathBuf::from("/books"),
        })
        .unwrap();

    let (controller, _script) =
        controller_with(StateStore::at(&store_path), Arc::new(SilenceSynthesizer::new()));

    assert_eq!(controller.status().track, None);
    assert_eq!(controller.last_folder(), Path::new("/books"));
}

#[tokio::test]
async fn unsupported_inputs_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (mut controller, _script) = controller_with(
        StateStore::at(dir.path().join("state.json")),
        Arc::new(SilenceSynthesizer::new()),
    );
    let err = controller.select_input(Path::new("/books/notes.pdf")).unwrap_err();
    assert!(matches!(err, SessionError::UnsupportedInput(_)));
}

#[tokio::test]
async fn text_input_converts_and_binds_the_result() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("chapter.txt");
    std::fs::write(&input, "Hello world. This is a short chapter.").unwrap();
    let store_path = dir.path().join("state.json");

    let (mut controller, _script) = controller_with(
        StateStore::at(&store_path),
        Arc::new(SilenceSynthesizer::new()),
    );

    controller.select_input(&input).unwrap();
    assert!(controller.is_converting());

    let terminal = wait_for_terminal(&mut controller).await;
    assert!(matches!(terminal, SessionEvent::ConversionCompleted { .. }));

    let output = dir.path().join("chapter.mp3");
    assert!(output.exists());
    assert_eq!(controller.status().track, Some(output.clone()));
    assert!(!controller.is_converting());

    let saved = saved_state(&store_path);
    assert_eq!(saved.audio_file, Some(output));
    assert_eq!(saved.position, 0.0);
    assert_eq!(saved.last_folder, dir.path());
}

#[tokio::test]
async fn only_one_conversion_runs_at_a_time() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("chapter.txt");
    std::fs::write(&input, "Some text worth reading aloud.").unwrap();

    let (mut controller, _script) = controller_with(
        StateStore::at(dir.path().join("state.json")),
        Arc::new(SlowSynth),
    );

    controller.select_input(&input).unwrap();
    let err = controller.select_input(&input).unwrap_err();
    assert!(matches!(err, SessionError::ConversionInProgress));

    controller.cancel_conversion();
    let terminal = wait_for_terminal(&mut controller).await;
    assert_eq!(terminal, SessionEvent::ConversionCancelled);
    assert!(!controller.is_converting());

    // A new job may start once the old one is done.
    controller.select_input(&input).unwrap();
    controller.cancel_conversion();
    wait_for_terminal(&mut controller).await;
}

#[tokio::test]
async fn audio_input_binds_directly() {
    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("album.mp3");
    std::fs::write(&track, b"mp3").unwrap();
    let store_path = dir.path().join("state.json");

    let (mut controller, _script) = controller_with(
        StateStore::at(&store_path),
        Arc::new(SilenceSynthesizer::new()),
    );

    controller.select_input(&track).unwrap();
    assert_eq!(controller.status().track, Some(track.clone()));
    assert!(!controller.is_converting());

    let saved = saved_state(&store_path);
    assert_eq!(saved.audio_file, Some(track));
    assert_eq!(saved.last_folder, dir.path());
}

#[tokio::test]
async fn pause_flushes_the_position_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("book.mp3");
    std::fs::write(&track, b"mp3").unwrap();
    let store_path = dir.path().join("state.json");

    let (mut controller, script) = controller_with(
        StateStore::at(&store_path),
        Arc::new(SilenceSynthesizer::new()),
    );

    controller.select_input(&track).unwrap();
    controller.play().unwrap();
    script.set_elapsed_ms(3000);
    controller.pause();

    assert_eq!(controller.status().position, 3.0);
    assert_eq!(saved_state(&store_path).position, 3.0);
}
