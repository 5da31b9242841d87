//! Playback for lector: the position-tracking state machine, the rodio
//! output device, and the symphonia duration probe.

pub mod device;
pub mod engine;
pub mod probe;
pub mod testing;

pub use device::RodioDevice;
pub use engine::{PlaybackEngine, TICK_INTERVAL};
pub use probe::SymphoniaProbe;
