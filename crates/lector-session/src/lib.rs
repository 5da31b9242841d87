//! Session layer for lector: one controller owning conversion, playback,
//! and the persisted resume state.

pub mod controller;

pub use controller::{SKIP_STEP_SECONDS, SessionController};
