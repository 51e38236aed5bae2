//! The real-time mix pipeline.
//!
//! Two halves, one per audio callback. [`CaptureFeed`] lives in the input
//! callback: it demuxes the device's interleaved frames into one SPSC
//! ring per hardware channel. [`Renderer`] lives in the output callback:
//! each tick it drains the rings into track scratch buffers, runs user
//! callbacks and effect chains, sums the surviving tracks into the master
//! bus, applies master effects and gain, meters, and emits interleaved
//! frames for the device.
//!
//! The rings are the only coupling between the two callbacks: the
//! renderer consumes whatever has arrived and pads with silence, so a
//! capture hiccup degrades to a quiet tick instead of a stall.

use std::sync::{Arc, atomic::Ordering};

use dsk_core::{ByteRing, RingConsumer, RingProducer};

use crate::{codec, constants::MAX_BUFFER_SIZE_BYTES, session::Shared};

/// Consumer side of the capture rings, installed into the session for the
/// renderer.
pub(crate) struct CaptureBus {
    consumers: Vec<RingConsumer>,
}

/// Producer side of the capture rings; owned by the input callback or the
/// test driving it.
pub struct CaptureFeed {
    producers: Vec<RingProducer>,
    bytes_in_wire: usize,
    channels: usize,
}

impl CaptureFeed {
    /// Builds `channels` rings, installs the consumer side into `shared`,
    /// and returns the producer side.
    pub(crate) fn install(shared: &Shared, channels: usize, capacity_frames: usize) -> CaptureFeed {
        let bytes_in_wire = shared.format.bytes_in_wire;
        // A tick drains a ring through one scratch-sized staging buffer,
        // so a ring may never hold more than that.
        let capacity = (capacity_frames * bytes_in_wire).min(MAX_BUFFER_SIZE_BYTES);

        let mut producers = Vec::with_capacity(channels);
        let mut consumers = Vec::with_capacity(channels);
        for _ in 0..channels {
            let (producer, consumer) = ByteRing::with_capacity(capacity);
            producers.push(producer);
            consumers.push(consumer);
        }

        *shared.capture.lock().unwrap() = Some(CaptureBus { consumers });

        CaptureFeed {
            producers,
            bytes_in_wire,
            channels,
        }
    }

    /// Number of hardware channels this feed demuxes.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Demuxes interleaved frames into the per-channel rings.
    ///
    /// Writes whole frames only, capped to the headroom of the fullest
    /// ring so the channels stay frame-aligned; excess input is dropped.
    /// Returns the number of frames written.
    pub fn write_interleaved(&mut self, bytes: &[u8]) -> usize {
        let bytes_per_frame = self.bytes_in_wire * self.channels;
        if bytes_per_frame == 0 {
            return 0;
        }

        let mut frames = bytes.len() / bytes_per_frame;
        for producer in &self.producers {
            frames = frames.min(producer.free_count() / self.bytes_in_wire);
        }

        for frame in 0..frames {
            let base = frame * bytes_per_frame;
            for (channel, producer) in self.producers.iter_mut().enumerate() {
                let start = base + channel * self.bytes_in_wire;
                producer.write_from(&bytes[start..start + self.bytes_in_wire]);
            }
        }
        frames
    }

    /// Bytes currently queued in the fullest ring.
    pub fn pending_bytes(&self) -> usize {
        self.producers.iter().map(|p| p.fill_count()).max().unwrap_or(0)
    }
}

/// Output-side worker: owns the master bus buffer and renders one tick
/// per call.
pub struct Renderer {
    shared: Arc<Shared>,
    out_channels: usize,
    master: Box<[u8; MAX_BUFFER_SIZE_BYTES]>,
    stage: Box<[u8; MAX_BUFFER_SIZE_BYTES]>,
}

impl Renderer {
    pub(crate) fn new(shared: Arc<Shared>, out_channels: usize) -> Self {
        Self {
            shared,
            out_channels,
            master: Box::new([0u8; MAX_BUFFER_SIZE_BYTES]),
            stage: Box::new([0u8; MAX_BUFFER_SIZE_BYTES]),
        }
    }

    /// Number of speaker channels each master sample is replicated to.
    #[inline]
    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    /// Renders one tick into `out`, a device buffer of interleaved
    /// frames, and returns the number of frames carrying mix data.
    ///
    /// `out.len() / (bytes_in_wire · out_channels)` is the tick's frame
    /// budget. When the rings are empty the first `frame_count_min`
    /// frames still count as emitted (they are silence) to satisfy
    /// backends with a minimum fill. The remainder of `out` is always
    /// zeroed.
    pub fn render(&mut self, out: &mut [u8], frame_count_min: usize) -> usize {
        let fmt = self.shared.format;
        let biw = fmt.bytes_in_wire;
        let bytes_per_out_frame = biw * self.out_channels;
        let frame_count_max = if bytes_per_out_frame == 0 {
            0
        } else {
            out.len() / bytes_per_out_frame
        };

        out.fill(0);

        // A structural mutation (add/delete/register) is in flight on the
        // control thread; skip this tick rather than wait for it.
        let Some(tracks) = self.shared.tracks.try_read() else {
            return 0;
        };

        let kind = fmt.kind;
        let rate = self.shared.sample_rate;
        let input_channels = self.shared.input_channels.load(Ordering::Relaxed);

        // Clear staging
        self.master.fill(0);
        let mut master_len = 0usize;
        for track in tracks.values() {
            track.scratch.lock().unwrap().zero_data();
        }

        // Drain every ring completely and fan each channel out to the
        // tracks listening on it
        let mut max_fill_samples = 0usize;
        if let Ok(mut capture) = self.shared.capture.try_lock() {
            if let Some(bus) = capture.as_mut() {
                for (channel, consumer) in bus.consumers.iter_mut().enumerate() {
                    let fill = consumer.read_into(&mut self.stage[..]);
                    let samples = fill / biw;
                    max_fill_samples = max_fill_samples.max(samples);

                    let input_rms = codec::rms(&self.stage[..fill], &fmt);
                    for track in tracks.values() {
                        if track.input_channel() != channel {
                            continue;
                        }
                        track.set_input_rms(input_rms);
                        let mut scratch = track.scratch.lock().unwrap();
                        codec::add_and_scale(&self.stage[..fill], scratch.data_mut(), &fmt, 1.0, samples);
                        scratch.set_len(fill);
                    }
                }
            }
        }

        // Raw input to the user
        for track in tracks.values() {
            if let Some(callback) = track.input_ready.get() {
                let mut scratch = track.scratch.lock().unwrap();
                callback(track.id(), scratch.valid_mut(), kind, rate, input_channels);
            }
        }

        // Track effect chains, in registration order
        for track in tracks.values() {
            for effect in track.effects.iter() {
                let mut scratch = track.scratch.lock().unwrap();
                effect(track.id(), scratch.valid_mut(), kind, rate, input_channels);
            }
        }

        // Effected output to the user
        for track in tracks.values() {
            if let Some(callback) = track.output_ready.get() {
                let mut scratch = track.scratch.lock().unwrap();
                callback(track.id(), scratch.valid_mut(), kind, rate, input_channels);
            }
        }

        // Sum surviving tracks into the master bus. Mute wins over solo;
        // with any solo engaged, only solo'd tracks pass.
        let solo_engaged = self.shared.solo_engaged();
        for track in tracks.values() {
            if track.is_muted() || (solo_engaged && !track.is_soloed()) {
                continue;
            }
            let gain = track.gain();
            let scratch = track.scratch.lock().unwrap();
            codec::add_and_scale(scratch.valid(), &mut self.master[..], &fmt, gain, scratch.len() / biw);
            master_len = master_len.max(scratch.len());
            track.set_output_rms(codec::rms(scratch.valid(), &fmt) * gain);
        }

        // Master effects, then master gain
        for effect in self.shared.master_effects.iter() {
            effect(&mut self.master[..master_len], kind, rate, input_channels);
        }
        let master_gain = self.shared.master_gain.load();
        codec::scale(&mut self.master[..master_len], &fmt, master_gain, master_len / biw);

        // Final buffer to the user
        if let Some(callback) = self.shared.master_output.get() {
            callback(&mut self.master[..master_len], kind, rate, input_channels);
        }

        // The master meter spans the whole tick; frames past the valid
        // length read as silence
        let metered = (frame_count_max * bytes_per_out_frame).min(MAX_BUFFER_SIZE_BYTES);
        self.shared.master_rms.store(codec::rms(&self.master[..metered], &fmt));

        // Emit: each mono master sample replicated across every speaker
        let mut read_count = frame_count_max.min(max_fill_samples);
        if read_count == 0 {
            read_count = frame_count_min.min(frame_count_max);
        }
        read_count = read_count.min(MAX_BUFFER_SIZE_BYTES / biw);
        for frame in 0..read_count {
            let sample = &self.master[frame * biw..(frame + 1) * biw];
            let base = frame * bytes_per_out_frame;
            for channel in 0..self.out_channels {
                let start = base + channel * biw;
                out[start..start + biw].copy_from_slice(sample);
            }
        }
        read_count
    }
}
