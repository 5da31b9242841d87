//! Rodio-backed output device.
//!
//! Rodio's stream types are not `Send`, so the device runs them on a
//! dedicated audio thread and the [`AudioDevice`] handle talks to it over
//! a command channel. Commands that can fail reply synchronously; the
//! cheap queries reply with plain values.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, error};

use lector_core::{AudioDevice, PlaybackError};

enum Command {
    Load(PathBuf, Sender<Result<(), PlaybackError>>),
    Play(Duration, Sender<Result<(), PlaybackError>>),
    Pause,
    Unpause,
    Stop,
    IsBusy(Sender<bool>),
    ElapsedMillis(Sender<u64>),
    Shutdown,
}

/// Handle to the audio thread. Implements [`AudioDevice`]; dropping it
/// shuts the thread down.
pub struct RodioDevice {
    commands: Sender<Command>,
}

impl RodioDevice {
    /// Spawn the audio thread and open the default output stream on it.
    ///
    /// Fails if the host has no usable output device.
    pub fn open_default() -> Result<Self, PlaybackError> {
        let (commands, inbox) = channel();
        let (ready_tx, ready_rx) = channel();
        std::thread::Builder::new()
            .name("lector-audio".into())
            .spawn(move || audio_thread(&inbox, &ready_tx))
            .map_err(|e| PlaybackError::device(format!("audio thread: {e}")))?;
        ready_rx
            .recv()
            .map_err(|_| PlaybackError::device("audio thread died during startup"))??;
        Ok(Self { commands })
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            error!("audio thread is gone");
        }
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command, fallback: T) -> T {
        let (tx, rx) = channel();
        self.send(make(tx));
        rx.recv().unwrap_or(fallback)
    }
}

impl AudioDevice for RodioDevice {
    fn load(&mut self, path: &Path) -> Result<(), PlaybackError> {
        self.request(
            |tx| Command::Load(path.to_path_buf(), tx),
            Err(PlaybackError::device("audio thread is gone")),
        )
    }

    fn play(&mut self, start_offset: Duration) -> Result<(), PlaybackError> {
        self.request(
            |tx| Command::Play(start_offset, tx),
            Err(PlaybackError::device("audio thread is gone")),
        )
    }

    fn pause(&mut self) {
        self.send(Command::Pause);
    }

    fn unpause(&mut self) {
        self.send(Command::Unpause);
    }

    fn stop(&mut self) {
        self.send(Command::Stop);
    }

    fn is_busy(&self) -> bool {
        self.request(Command::IsBusy, false)
    }

    fn elapsed_millis(&self) -> u64 {
        self.request(Command::ElapsedMillis, 0)
    }
}

impl Drop for RodioDevice {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

struct AudioThread {
    handle: OutputStreamHandle,
    track: Option<PathBuf>,
    sink: Option<Sink>,
    /// Sink position at the last play or unpause.
    baseline: Duration,
}

fn audio_thread(
    inbox: &Receiver<Command>,
    ready: &Sender<Result<(), PlaybackError>>,
) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready.send(Err(PlaybackError::device(format!("open output: {e}"))));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    let mut thread = AudioThread {
        handle,
        track: None,
        sink: None,
        baseline: Duration::ZERO,
    };

    while let Ok(command) = inbox.recv() {
        match command {
            Command::Load(path, reply) => {
                let _ = reply.send(thread.load(path));
            }
            Command::Play(offset, reply) => {
                let _ = reply.send(thread.play(offset));
            }
            Command::Pause => {
                if let Some(sink) = &thread.sink {
                    sink.pause();
                }
            }
            Command::Unpause => {
                if let Some(sink) = &thread.sink {
                    sink.play();
                    thread.baseline = sink.get_pos();
                }
            }
            Command::Stop => {
                if let Some(sink) = thread.sink.take() {
                    sink.stop();
                }
            }
            Command::IsBusy(reply) => {
                let busy = thread.sink.as_ref().is_some_and(|s| !s.empty());
                let _ = reply.send(busy);
            }
            Command::ElapsedMillis(reply) => {
                let elapsed = thread
                    .sink
                    .as_ref()
                    .map_or(Duration::ZERO, |s| s.get_pos().saturating_sub(thread.baseline));
                let _ = reply.send(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
            }
            Command::Shutdown => break,
        }
    }
    debug!("audio thread exiting");
}

impl AudioThread {
    fn load(&mut self, path: PathBuf) -> Result<(), PlaybackError> {
        if !path.is_file() {
            return Err(PlaybackError::UnreadableTrack(path));
        }
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.track = Some(path);
        Ok(())
    }

    fn play(&mut self, offset: Duration) -> Result<(), PlaybackError> {
        let track = self.track.clone().ok_or(PlaybackError::NoTrack)?;
        let file = File::open(&track)
            .map_err(|_| PlaybackError::UnreadableTrack(track.clone()))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| PlaybackError::device(format!("decode {}: {e}", track.display())))?
            .skip_duration(offset);

        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| PlaybackError::device(format!("sink: {e}")))?;
        sink.append(source);
        sink.play();
        self.baseline = Duration::ZERO;
        self.sink = Some(sink);
        debug!(track = %track.display(), offset_ms = offset.as_millis() as u64, "stream started");
        Ok(())
    }
}
