//! The engine: one session, one device rack, up to two live streams.
//!
//! An [`Engine`] is an explicit value owned by the caller; the audio
//! callbacks hold references to the session captured at stream-open time,
//! so there is no process-wide state. Dropping the engine stops both
//! streams and releases everything.

use std::sync::atomic::Ordering;

use dsk_core::Result;

use crate::{
    devices::DeviceRack,
    format::{SampleKind, SampleRate},
    session::Session,
    stream,
};

/// A live mixing engine bound to the host's audio devices.
///
/// Derefs to [`Session`], so the whole control API (tracks, solo/mute,
/// volumes, effect registration) is available directly on the engine.
pub struct Engine {
    session: Session,
    devices: DeviceRack,
    input_stream: Option<cpal::Stream>,
    output_stream: Option<cpal::Stream>,
}

impl Engine {
    /// Starts an engine session: connects the host backend, loads device
    /// lists, and verifies the default devices accept the requested rate.
    ///
    /// Streams are started separately with
    /// [`Engine::start_input_stream`] / [`Engine::start_output_stream`];
    /// no audio flows until then.
    pub fn start(sample_rate: SampleRate, kind: SampleKind) -> Result<Self> {
        let session = Session::new(sample_rate, kind)?;
        let devices = DeviceRack::connect()?;
        devices.validate_default_rates(sample_rate)?;
        Ok(Self {
            session,
            devices,
            input_stream: None,
            output_stream: None,
        })
    }

    /// The session driving this engine.
    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The host's device rack.
    #[inline]
    pub fn devices(&self) -> &DeviceRack {
        &self.devices
    }

    /// Identifier of the audio backend in use.
    pub fn current_backend(&self) -> &'static str {
        self.devices.backend_name()
    }

    /// Adds a track recorded against the default input device.
    pub fn add_track(&self, id: i32) -> Result<()> {
        self.session.add_track(id)?;
        if let Ok(index) = self.devices.default_input_index() {
            self.session.choose_input_device(id, index)?;
        }
        Ok(())
    }

    /// Opens and starts the capture stream on the given input device.
    ///
    /// Rebuilds the per-channel rings for the device's channel layout. An
    /// already-running input stream is replaced.
    pub fn start_input_stream(&mut self, device_index: i32, latency_secs: f32) -> Result<()> {
        self.stop_input_stream();
        let stream = stream::start_input_stream(&self.session, &self.devices, device_index, latency_secs)?;
        self.input_stream = Some(stream);
        Ok(())
    }

    /// Stops the capture stream, if one is running.
    pub fn stop_input_stream(&mut self) {
        self.session.shared().input_running.store(false, Ordering::Relaxed);
        self.input_stream = None;
        self.session.close_capture();
    }

    /// Opens and starts the playback stream on the given output device.
    ///
    /// An already-running output stream is replaced.
    pub fn start_output_stream(&mut self, device_index: i32, latency_secs: f32) -> Result<()> {
        self.stop_output_stream();
        let stream = stream::start_output_stream(&self.session, &self.devices, device_index, latency_secs)?;
        self.output_stream = Some(stream);
        Ok(())
    }

    /// Stops the playback stream, if one is running.
    pub fn stop_output_stream(&mut self) {
        self.session.shared().output_running.store(false, Ordering::Relaxed);
        self.output_stream = None;
    }

    /// `true` while a capture stream is open.
    pub fn input_stream_running(&self) -> bool {
        self.input_stream.is_some()
    }

    /// `true` while a playback stream is open.
    pub fn output_stream_running(&self) -> bool {
        self.output_stream.is_some()
    }

    /// RMS of the most recent master output tick, in `[0, 1]`.
    pub fn current_output_rms(&self) -> f32 {
        self.session.master_rms()
    }

    /// Stops streams and releases the session. Equivalent to dropping the
    /// engine.
    pub fn destroy(self) {}
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop_output_stream();
        self.stop_input_stream();
    }
}

impl std::ops::Deref for Engine {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}
