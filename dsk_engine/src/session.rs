//! Session state and the control-thread API.
//!
//! A [`Session`] owns everything that outlives a single callback: the
//! format, the track registry, the master bus parameters and the capture
//! rings. All mutators here run on the control thread; they are either
//! single atomic stores or brief critical sections the audio thread never
//! blocks on.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use dsk_core::{AtomicF32, DskError, PublishSlots, Result, db_to_gain};

use crate::{
    callback::{CallbackCell, MasterCallback, TrackCallback},
    constants::{DEFAULT_BUFFER_FRAMES, MAX_NUM_EFFECTS},
    format::{FormatInfo, SampleKind, SampleRate},
    mixer::{CaptureBus, CaptureFeed, Renderer},
    registry::TrackRegistry,
    track::Track,
};

/// State shared between the control thread and the audio callbacks.
pub(crate) struct Shared {
    pub(crate) format: FormatInfo,
    pub(crate) sample_rate: SampleRate,
    pub(crate) master_gain: AtomicF32,
    pub(crate) master_rms: AtomicF32,
    pub(crate) tracks: TrackRegistry,
    pub(crate) solo_count: AtomicUsize,
    pub(crate) master_effects: PublishSlots<MasterCallback, MAX_NUM_EFFECTS>,
    pub(crate) master_output: CallbackCell<MasterCallback>,
    pub(crate) capture: Mutex<Option<CaptureBus>>,
    pub(crate) input_channels: AtomicUsize,
    pub(crate) input_running: AtomicBool,
    pub(crate) output_running: AtomicBool,
    pub(crate) underruns: AtomicUsize,
}

impl Shared {
    #[inline]
    pub(crate) fn solo_engaged(&self) -> bool {
        self.solo_count.load(Ordering::Relaxed) > 0
    }

    /// Gives back the solo count held by a track leaving the registry.
    fn release_solo(&self, track: &Track) {
        if track.is_soloed() {
            self.solo_count.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

/// A mixing session: format, tracks, master bus, capture rings.
///
/// [`crate::Engine`] wraps a session together with host devices and
/// streams; headless users (tests, offline rendering, custom backends)
/// drive a session directly through [`Session::open_capture`] and
/// [`Session::renderer`].
pub struct Session {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session with the given sample rate and format.
    ///
    /// `F64` cannot be streamed or mixed and is rejected with
    /// [`DskError::Invalid`].
    pub fn new(sample_rate: SampleRate, kind: SampleKind) -> Result<Self> {
        if kind == SampleKind::F64 {
            return Err(DskError::Invalid);
        }
        Ok(Self {
            shared: Arc::new(Shared {
                format: FormatInfo::of(kind),
                sample_rate,
                master_gain: AtomicF32::new(1.0),
                master_rms: AtomicF32::new(0.0),
                tracks: TrackRegistry::new(),
                solo_count: AtomicUsize::new(0),
                master_effects: PublishSlots::new(),
                master_output: CallbackCell::new(),
                capture: Mutex::new(None),
                input_channels: AtomicUsize::new(0),
                input_running: AtomicBool::new(false),
                output_running: AtomicBool::new(false),
                underruns: AtomicUsize::new(0),
            }),
        })
    }

    #[inline]
    pub fn sample_rate(&self) -> SampleRate {
        self.shared.sample_rate
    }

    #[inline]
    pub fn kind(&self) -> SampleKind {
        self.shared.format.kind
    }

    #[inline]
    pub fn format(&self) -> FormatInfo {
        self.shared.format
    }

    /// The track registry (lookups and advanced inspection).
    #[inline]
    pub fn tracks(&self) -> &TrackRegistry {
        &self.shared.tracks
    }

    fn track(&self, id: i32) -> Result<Arc<Track>> {
        self.shared.tracks.get(id).ok_or(DskError::TrackNotFound)
    }

    /// Adds a track with the given id, replacing any existing track with
    /// that id.
    pub fn add_track(&self, id: i32) -> Result<()> {
        if let Some(displaced) = self.shared.tracks.insert(Arc::new(Track::new(id))) {
            self.shared.release_solo(&displaced);
        }
        Ok(())
    }

    /// Deletes the track with the given id.
    pub fn delete_track(&self, id: i32) -> Result<()> {
        match self.shared.tracks.remove(id) {
            Some(track) => {
                self.shared.release_solo(&track);
                Ok(())
            }
            None => Err(DskError::TrackNotFound),
        }
    }

    /// Deletes every track.
    pub fn delete_all_tracks(&self) {
        for track in self.shared.tracks.drain() {
            self.shared.release_solo(&track);
        }
    }

    /// Records the input device for a track.
    ///
    /// Informational with a single open input device; routing follows the
    /// channel index only.
    pub fn choose_input_device(&self, id: i32, device_index: i32) -> Result<()> {
        self.track(id)?.set_input_device(device_index);
        Ok(())
    }

    /// Routes a track to a hardware input channel.
    ///
    /// An index beyond the open device's channel count is tolerated; the
    /// track simply receives silence until the channel exists.
    pub fn choose_input_channel(&self, id: i32, channel_index: usize) -> Result<()> {
        self.track(id)?.set_input_channel(channel_index);
        Ok(())
    }

    /// RMS of the raw capture feeding the track, in `[0, 1]`.
    pub fn track_input_rms(&self, id: i32) -> Result<f32> {
        Ok(self.track(id)?.input_rms())
    }

    /// RMS of the track's post-gain mix contribution, in `[0, 1]`.
    pub fn track_output_rms(&self, id: i32) -> Result<f32> {
        Ok(self.track(id)?.output_rms())
    }

    /// Solos a track. Idempotent: soloing twice holds one solo count.
    pub fn solo_enable(&self, id: i32) -> Result<()> {
        let track = self.track(id)?;
        if !track.swap_soloed(true) {
            self.shared.solo_count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Un-solos a track. Idempotent.
    pub fn solo_disable(&self, id: i32) -> Result<()> {
        let track = self.track(id)?;
        if track.swap_soloed(false) {
            self.shared.solo_count.fetch_sub(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// `true` while at least one track is solo'd.
    #[inline]
    pub fn solo_engaged(&self) -> bool {
        self.shared.solo_engaged()
    }

    /// Mutes a track. Mute wins over solo at mix time.
    pub fn mute_enable(&self, id: i32) -> Result<()> {
        self.track(id)?.set_muted(true);
        Ok(())
    }

    /// Unmutes a track.
    pub fn mute_disable(&self, id: i32) -> Result<()> {
        self.track(id)?.set_muted(false);
        Ok(())
    }

    /// Sets a track's volume from a decibel value (0 dB = unity).
    pub fn set_track_volume(&self, id: i32, db: f32) -> Result<()> {
        self.track(id)?.set_gain(db_to_gain(db));
        Ok(())
    }

    /// Sets the master volume from a decibel value (0 dB = unity).
    pub fn set_master_volume(&self, db: f32) {
        self.shared.master_gain.store(db_to_gain(db));
    }

    /// Current master gain magnitude.
    #[inline]
    pub fn master_gain(&self) -> f32 {
        self.shared.master_gain.load()
    }

    /// RMS of the most recent master tick, in `[0, 1]`.
    #[inline]
    pub fn master_rms(&self) -> f32 {
        self.shared.master_rms.load()
    }

    /// Appends an effect to a track's chain.
    ///
    /// Chains are bounded at [`MAX_NUM_EFFECTS`]; a full chain reports
    /// [`DskError::IndexOutOfBounds`].
    pub fn register_effect(&self, id: i32, effect: TrackCallback) -> Result<()> {
        self.track(id)?
            .effects
            .push(effect)
            .map_err(|_| DskError::IndexOutOfBounds)
    }

    /// Installs the callback observing a track's raw input, replacing any
    /// previous one.
    pub fn register_input_ready_callback(&self, id: i32, callback: TrackCallback) -> Result<()> {
        self.track(id)?.input_ready.set(callback);
        Ok(())
    }

    /// Installs the callback observing a track's post-effect output.
    pub fn register_output_ready_callback(&self, id: i32, callback: TrackCallback) -> Result<()> {
        self.track(id)?.output_ready.set(callback);
        Ok(())
    }

    /// Appends an effect to the master chain.
    pub fn register_master_effect(&self, effect: MasterCallback) -> Result<()> {
        self.shared
            .master_effects
            .push(effect)
            .map_err(|_| DskError::IndexOutOfBounds)
    }

    /// Installs the callback observing the final master buffer.
    pub fn register_master_output_ready_callback(&self, callback: MasterCallback) {
        self.shared.master_output.set(callback);
    }

    /// Number of output underruns reported by the backend.
    pub fn underrun_count(&self) -> usize {
        self.shared.underruns.load(Ordering::Relaxed)
    }

    /// Builds one capture ring per hardware channel and returns the
    /// producer side.
    ///
    /// The returned [`CaptureFeed`] belongs to the input callback (or the
    /// test driving it); the consumer side is installed into the session
    /// for the renderer. Ring capacity is `capacity_frames` samples,
    /// clamped so a tick can always drain a full ring.
    pub fn open_capture(&self, channels: usize, capacity_frames: usize) -> CaptureFeed {
        let feed = CaptureFeed::install(&self.shared, channels, capacity_frames);
        self.shared.input_channels.store(channels, Ordering::Relaxed);
        feed
    }

    /// Convenience for [`Session::open_capture`] with the default ring
    /// headroom.
    pub fn open_default_capture(&self, channels: usize) -> CaptureFeed {
        self.open_capture(channels, DEFAULT_BUFFER_FRAMES)
    }

    /// Tears down the capture rings. The channel count last seen by the
    /// callbacks is retained.
    pub fn close_capture(&self) {
        *self.shared.capture.lock().unwrap() = None;
    }

    /// Creates a renderer producing interleaved output for
    /// `out_channels` speaker channels.
    pub fn renderer(&self, out_channels: usize) -> Renderer {
        Renderer::new(Arc::clone(&self.shared), out_channels)
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }
}
