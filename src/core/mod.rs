//! Core types shared across StitchFlow.
//!
//! Configuration and the injectable clock used by the store and the
//! presence broadcaster.

mod clock;
mod config;

pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use config::{AiConfig, Config, GeneralConfig, PresenceConfig};
