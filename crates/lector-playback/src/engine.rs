//! The playback state machine.
//!
//! Owns the output device exclusively and derives the playback position
//! from the device's own elapsed-time report, never from wall-clock
//! arithmetic: `position = play_start_position + elapsed / 1000`. A
//! background tracking loop samples that formula every 100ms while
//! playing and posts `PositionChanged` events.
//!
//! Seeking restarts the stream at the target offset. Seeks are optimistic
//! while the duration is still unknown: only the lower bound is clamped,
//! and the position is re-clamped once the probe reports the duration.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use lector_core::{AudioDevice, PlayState, PlaybackError, PlaybackSnapshot, SessionEvent};

/// Tracking loop cadence.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

struct Inner {
    device: Box<dyn AudioDevice>,
    track: Option<PathBuf>,
    /// Offset the current stream started at, in seconds.
    play_start_position: f64,
    position: f64,
    duration: Option<f64>,
    state: PlayState,
}

/// Playback engine. Cheap to clone handles are not provided; the session
/// controller is the single owner and all methods lock internally.
pub struct PlaybackEngine {
    inner: Arc<Mutex<Inner>>,
    events: UnboundedSender<SessionEvent>,
    shutdown: CancellationToken,
}

impl PlaybackEngine {
    /// Create an engine around a device and start its tracking loop.
    #[must_use]
    pub fn new(device: Box<dyn AudioDevice>, events: UnboundedSender<SessionEvent>) -> Self {
        let inner = Arc::new(Mutex::new(Inner {
            device,
            track: None,
            play_start_position: 0.0,
            position: 0.0,
            duration: None,
            state: PlayState::Stopped,
        }));
        let shutdown = CancellationToken::new();
        tokio::spawn(tracking_loop(
            Arc::clone(&inner),
            events.clone(),
            shutdown.clone(),
        ));
        Self {
            inner,
            events,
            shutdown,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Bind a track as the playback target, replacing any previous one.
    /// Playback stops; position is set to `initial_position` and the
    /// duration resets to unknown until the probe reports it.
    pub fn bind(&self, path: impl Into<PathBuf>, initial_position: f64) {
        let path = path.into();
        let mut inner = self.lock();
        inner.device.stop();
        inner.state = PlayState::Stopped;
        inner.track = Some(path.clone());
        inner.position = initial_position.max(0.0);
        inner.play_start_position = inner.position;
        inner.duration = None;
        info!(track = %path.display(), position = inner.position, "track bound");
        let _ = self.events.send(SessionEvent::TrackBound { path });
        let _ = self.events.send(SessionEvent::position(inner.position));
    }

    /// Start playing the bound track from the current position.
    /// A no-op while already playing.
    pub fn play(&self) -> Result<(), PlaybackError> {
        let mut inner = self.lock();
        if inner.state == PlayState::Playing {
            return Ok(());
        }
        let offset = inner.position;
        self.start_stream(&mut inner, offset)?;
        inner.state = PlayState::Playing;
        debug!(offset, "playback started");
        let _ = self.events.send(SessionEvent::PlayStateChanged {
            state: PlayState::Playing,
        });
        Ok(())
    }

    /// Load the bound track and start output at `offset`. On device
    /// failure the transition is aborted: the device is stopped and the
    /// engine reverts to `Stopped` so tracking ticks stay inert. The
    /// stored position is untouched either way.
    fn start_stream(&self, inner: &mut Inner, offset: f64) -> Result<(), PlaybackError> {
        let track = inner.track.clone().ok_or(PlaybackError::NoTrack)?;
        let started = match inner.device.load(&track) {
            Ok(()) => inner.device.play(Duration::from_secs_f64(offset)),
            Err(err) => Err(err),
        };
        match started {
            Ok(()) => {
                inner.play_start_position = offset;
                Ok(())
            }
            Err(err) => {
                inner.device.stop();
                if inner.state != PlayState::Stopped {
                    inner.state = PlayState::Stopped;
                    let _ = self.events.send(SessionEvent::PlayStateChanged {
                        state: PlayState::Stopped,
                    });
                }
                Err(err)
            }
        }
    }

    /// Suspend output, retaining the position. A no-op unless playing and
    /// the device still reports active output.
    pub fn pause(&self) {
        let mut inner = self.lock();
        if inner.state != PlayState::Playing || !inner.device.is_busy() {
            return;
        }
        let pos = inner.play_start_position
            + inner.device.elapsed_millis() as f64 / 1000.0;
        inner.position = pos;
        inner.device.pause();
        inner.state = PlayState::Paused;
        let _ = self.events.send(SessionEvent::position(pos));
        let _ = self.events.send(SessionEvent::PlayStateChanged {
            state: PlayState::Paused,
        });
    }

    /// Resume suspended output. A no-op unless paused.
    ///
    /// If a seek landed while paused the suspended stream was discarded;
    /// in that case a fresh stream is started at the stored position.
    pub fn resume(&self) -> Result<(), PlaybackError> {
        let mut inner = self.lock();
        if inner.state != PlayState::Paused {
            return Ok(());
        }
        if inner.device.is_busy() {
            inner.device.unpause();
            let offset = inner.position;
            inner.play_start_position = offset;
        } else {
            let offset = inner.position;
            self.start_stream(&mut inner, offset)?;
        }
        inner.state = PlayState::Playing;
        let _ = self.events.send(SessionEvent::PlayStateChanged {
            state: PlayState::Playing,
        });
        Ok(())
    }

    /// Stop output and reset the position to zero.
    pub fn stop(&self) {
        let mut inner = self.lock();
        if inner.state == PlayState::Stopped {
            return;
        }
        inner.device.stop();
        inner.position = 0.0;
        inner.play_start_position = 0.0;
        inner.state = PlayState::Stopped;
        let _ = self.events.send(SessionEvent::position(0.0));
        let _ = self.events.send(SessionEvent::PlayStateChanged {
            state: PlayState::Stopped,
        });
    }

    /// Seek to an absolute position in seconds.
    ///
    /// Clamped below at zero always, and above at the duration once known.
    /// While playing, the stream is restarted at the target offset; if the
    /// device refuses the restart the engine reverts to `Stopped` with the
    /// clamped target kept as the position.
    pub fn seek(&self, seconds: f64) -> Result<(), PlaybackError> {
        let mut inner = self.lock();
        self.seek_inner(&mut inner, seconds)
    }

    /// Seek relative to the current position. Negative skips clamp at zero.
    /// The delta is applied to the position read under the same lock, so a
    /// tracking tick can never slip in between the read and the seek.
    pub fn skip(&self, delta_seconds: f64) -> Result<(), PlaybackError> {
        let mut inner = self.lock();
        let target = inner.position + delta_seconds;
        self.seek_inner(&mut inner, target)
    }

    fn seek_inner(&self, inner: &mut Inner, seconds: f64) -> Result<(), PlaybackError> {
        if inner.track.is_none() {
            return Err(PlaybackError::NoTrack);
        }
        let mut target = seconds.max(0.0);
        if let Some(duration) = inner.duration {
            target = target.min(duration);
        }
        inner.position = target;
        let _ = self.events.send(SessionEvent::position(target));
        match inner.state {
            PlayState::Playing => {
                inner.device.stop();
                self.start_stream(inner, target)?;
            }
            PlayState::Paused => {
                // The suspended stream is stale now; resume restarts it.
                inner.device.stop();
            }
            PlayState::Stopped => {}
        }
        debug!(target, "seek");
        Ok(())
    }

    /// Record the probed duration and re-clamp the position against it.
    pub fn set_duration(&self, seconds: f64) {
        let mut inner = self.lock();
        inner.duration = Some(seconds);
        let _ = self.events.send(SessionEvent::DurationComputed { seconds });
        if inner.position > seconds {
            inner.position = seconds;
            let _ = self.events.send(SessionEvent::position(seconds));
        }
    }

    /// Read-only snapshot of the current playback state.
    #[must_use]
    pub fn snapshot(&self) -> PlaybackSnapshot {
        let inner = self.lock();
        PlaybackSnapshot {
            track: inner.track.clone(),
            position: inner.position,
            duration: inner.duration,
            state: inner.state,
        }
    }

    /// Run one tracking-loop step synchronously. The loop calls this every
    /// 100ms; tests call it directly to step time deterministically.
    pub fn tick(&self) {
        let mut inner = self.lock();
        tick_inner(&mut inner, &self.events);
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn tick_inner(inner: &mut Inner, events: &UnboundedSender<SessionEvent>) {
    if inner.state != PlayState::Playing {
        return;
    }
    if !inner.device.is_busy() {
        // Natural end of the track: back to the start, stopped.
        inner.device.stop();
        inner.position = 0.0;
        inner.play_start_position = 0.0;
        inner.state = PlayState::Stopped;
        debug!("track finished");
        let _ = events.send(SessionEvent::position(0.0));
        let _ = events.send(SessionEvent::PlayStateChanged {
            state: PlayState::Stopped,
        });
        return;
    }
    let position =
        inner.play_start_position + inner.device.elapsed_millis() as f64 / 1000.0;
    inner.position = position;
    let _ = events.send(SessionEvent::position(position));
}

async fn tracking_loop(
    inner: Arc<Mutex<Inner>>,
    events: UnboundedSender<SessionEvent>,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = interval.tick() => {
                let mut guard = match inner.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                tick_inner(&mut guard, &events);
            }
        }
    }
}
