//! Track entity.
//!
//! A track taps one hardware input channel, runs the captured samples
//! through its effect chain, and contributes the result to the master bus
//! with its own gain, mute and solo state. Control-thread mutators are
//! single atomic stores; the scratch buffer belongs to the audio thread,
//! which takes its (never contended) lock once per tick.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering},
};

use dsk_core::{AtomicF32, PublishSlots};

use crate::{
    callback::{CallbackCell, TrackCallback},
    constants::{MAX_BUFFER_SIZE_BYTES, MAX_NUM_EFFECTS},
};

/// Fixed-size working buffer plus its valid-byte count.
pub(crate) struct Scratch {
    data: Box<[u8; MAX_BUFFER_SIZE_BYTES]>,
    len: usize,
}

impl Scratch {
    fn new() -> Self {
        Self {
            data: Box::new([0u8; MAX_BUFFER_SIZE_BYTES]),
            len: 0,
        }
    }

    /// Zeroes the storage without touching the valid length.
    #[inline]
    pub(crate) fn zero_data(&mut self) {
        self.data.fill(0);
    }

    #[inline]
    pub(crate) fn set_len(&mut self, len: usize) {
        self.len = len.min(MAX_BUFFER_SIZE_BYTES);
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// The valid region.
    #[inline]
    pub(crate) fn valid(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// The valid region, mutably.
    #[inline]
    pub(crate) fn valid_mut(&mut self) -> &mut [u8] {
        let len = self.len;
        &mut self.data[..len]
    }

    /// The whole storage, mutably.
    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data[..]
    }
}

/// A logical mixer track.
pub struct Track {
    id: i32,
    gain: AtomicF32,
    muted: AtomicBool,
    soloed: AtomicBool,
    input_device: AtomicI32,
    input_channel: AtomicUsize,
    input_rms: AtomicF32,
    output_rms: AtomicF32,
    pub(crate) scratch: Mutex<Scratch>,
    pub(crate) effects: PublishSlots<TrackCallback, MAX_NUM_EFFECTS>,
    pub(crate) input_ready: CallbackCell<TrackCallback>,
    pub(crate) output_ready: CallbackCell<TrackCallback>,
}

impl Track {
    /// Creates a track with unity gain, no mute/solo, routed to channel 0.
    pub fn new(id: i32) -> Self {
        Self {
            id,
            gain: AtomicF32::new(1.0),
            muted: AtomicBool::new(false),
            soloed: AtomicBool::new(false),
            input_device: AtomicI32::new(-1),
            input_channel: AtomicUsize::new(0),
            input_rms: AtomicF32::new(0.0),
            output_rms: AtomicF32::new(0.0),
            scratch: Mutex::new(Scratch::new()),
            effects: PublishSlots::new(),
            input_ready: CallbackCell::new(),
            output_ready: CallbackCell::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Current linear gain magnitude.
    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain.load()
    }

    #[inline]
    pub fn set_gain(&self, magnitude: f32) {
        self.gain.store(magnitude);
    }

    #[inline]
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_soloed(&self) -> bool {
        self.soloed.load(Ordering::Relaxed)
    }

    /// Flips the solo flag and returns its previous value, so the caller
    /// can keep the session solo count transition-exact.
    #[inline]
    pub(crate) fn swap_soloed(&self, soloed: bool) -> bool {
        self.soloed.swap(soloed, Ordering::Relaxed)
    }

    /// The input device recorded for this track.
    ///
    /// Stored for API parity only: with a single open input device,
    /// routing uses [`Track::input_channel`] alone.
    #[inline]
    pub fn input_device(&self) -> i32 {
        self.input_device.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_input_device(&self, device_index: i32) {
        self.input_device.store(device_index, Ordering::Relaxed);
    }

    /// The hardware channel whose ring buffer feeds this track.
    #[inline]
    pub fn input_channel(&self) -> usize {
        self.input_channel.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_input_channel(&self, channel_index: usize) {
        self.input_channel.store(channel_index, Ordering::Relaxed);
    }

    /// RMS of the raw capture feeding this track, in `[0, 1]`.
    #[inline]
    pub fn input_rms(&self) -> f32 {
        self.input_rms.load()
    }

    #[inline]
    pub(crate) fn set_input_rms(&self, level: f32) {
        self.input_rms.store(level);
    }

    /// RMS of this track's post-gain contribution to the mix, in `[0, 1]`.
    #[inline]
    pub fn output_rms(&self) -> f32 {
        self.output_rms.load()
    }

    #[inline]
    pub(crate) fn set_output_rms(&self, level: f32) {
        self.output_rms.store(level);
    }
}
