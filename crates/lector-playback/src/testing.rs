//! Scripted in-memory device for state-machine tests.
//!
//! The device never touches audio hardware; tests drive its elapsed-time
//! report and busy flag through a [`DeviceScript`] handle and assert on
//! the call log afterwards.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lector_core::{AudioDevice, PlaybackError};

#[derive(Default)]
struct Shared {
    elapsed_ms: AtomicU64,
    busy: AtomicBool,
    fail_next_play: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl Shared {
    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

/// The [`AudioDevice`] half; hand it to the engine.
pub struct ScriptedDevice {
    shared: Arc<Shared>,
}

/// The test's half; drives the device while the engine owns it.
#[derive(Clone)]
pub struct DeviceScript {
    shared: Arc<Shared>,
}

impl ScriptedDevice {
    /// Create a linked device/script pair.
    #[must_use]
    pub fn new() -> (Self, DeviceScript) {
        let shared = Arc::new(Shared::default());
        (
            Self {
                shared: Arc::clone(&shared),
            },
            DeviceScript { shared },
        )
    }
}

impl DeviceScript {
    /// Set the device-reported elapsed time since the last play/unpause.
    pub fn set_elapsed_ms(&self, ms: u64) {
        self.shared.elapsed_ms.store(ms, Ordering::SeqCst);
    }

    /// Simulate the track reaching its natural end.
    pub fn finish_track(&self) {
        self.shared.busy.store(false, Ordering::SeqCst);
    }

    /// Make the next `play` call fail.
    pub fn fail_next_play(&self) {
        self.shared.fail_next_play.store(true, Ordering::SeqCst);
    }

    /// Every device call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.shared
            .calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl AudioDevice for ScriptedDevice {
    fn load(&mut self, path: &Path) -> Result<(), PlaybackError> {
        self.shared.record(format!("load:{}", path.display()));
        Ok(())
    }

    fn play(&mut self, start_offset: Duration) -> Result<(), PlaybackError> {
        self.shared.record(format!("play:{}", start_offset.as_millis()));
        if self.shared.fail_next_play.swap(false, Ordering::SeqCst) {
            return Err(PlaybackError::device("scripted failure"));
        }
        self.shared.busy.store(true, Ordering::SeqCst);
        self.shared.elapsed_ms.store(0, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&mut self) {
        self.shared.record("pause".into());
    }

    fn unpause(&mut self) {
        self.shared.record("unpause".into());
        self.shared.elapsed_ms.store(0, Ordering::SeqCst);
    }

    fn stop(&mut self) {
        self.shared.record("stop".into());
        self.shared.busy.store(false, Ordering::SeqCst);
        self.shared.elapsed_ms.store(0, Ordering::SeqCst);
    }

    fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::SeqCst)
    }

    fn elapsed_millis(&self) -> u64 {
        self.shared.elapsed_ms.load(Ordering::SeqCst)
    }
}
