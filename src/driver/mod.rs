//! Poll driver
//!
//! The async shell around [`crate::radar::Radar`]: a fixed-interval loop,
//! per-instrument confirmation timers and start/stop/reset controls.

mod clock;
mod error;
mod service;
mod timers;

pub use clock::RadarClock;
pub use error::RadarError;
pub use service::RadarService;
pub use timers::ConfirmTimers;
