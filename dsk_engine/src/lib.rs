//! # Desk Audio Engine
//!
//! A real-time, multi-track mixing engine for desktop capture and
//! playback. One physical input device feeds per-channel ring buffers;
//! each hardware channel routes to any number of logical tracks, which
//! apply gain, mute, solo and a chain of user effects before summing
//! into a master bus that drives one physical output device.
//!
//! The [`Engine`] value owns everything: session state, device lists and
//! the two host streams. Headless use (tests, offline rendering, custom
//! backends) goes through [`Session`] directly, which hands out the same
//! [`mixer::CaptureFeed`] and [`mixer::Renderer`] the live streams use.

pub mod callback;
pub mod codec;
pub mod constants;
pub mod devices;
pub mod engine;
pub mod format;
pub mod mixer;
pub mod registry;
pub mod session;
mod stream;
pub mod track;

pub use callback::{MasterCallback, TrackCallback};
pub use devices::DeviceInfo;
pub use dsk_core::{DskError, Result};
pub use engine::Engine;
pub use format::{FormatInfo, SampleKind, SampleRate};
pub use mixer::{CaptureFeed, Renderer};
pub use session::Session;
