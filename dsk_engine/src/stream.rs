//! Host stream lifecycle.
//!
//! Builds the raw cpal streams and binds them to the session: the input
//! stream owns a [`crate::mixer::CaptureFeed`], the output stream owns a
//! [`crate::mixer::Renderer`]. Both closures gate on the session's
//! running flags so teardown never races a callback in flight.

use std::sync::{Arc, atomic::Ordering};

use cpal::traits::{DeviceTrait, StreamTrait};
use dsk_core::{DskError, Result};

use crate::{devices::DeviceRack, session::Session};

fn stream_config(channels: usize, rate_hz: u32, latency_secs: f32) -> cpal::StreamConfig {
    let buffer_size = if latency_secs > 0.0 {
        cpal::BufferSize::Fixed((latency_secs * rate_hz as f32) as cpal::FrameCount)
    } else {
        cpal::BufferSize::Default
    };
    cpal::StreamConfig {
        channels: channels as cpal::ChannelCount,
        sample_rate: cpal::SampleRate(rate_hz),
        buffer_size,
    }
}

pub(crate) fn start_input_stream(
    session: &Session,
    rack: &DeviceRack,
    device_index: i32,
    latency_secs: f32,
) -> Result<cpal::Stream> {
    let sample_format = session.format().stream_format().ok_or(DskError::IncompatibleDevice)?;
    let device = rack.input_device(device_index)?;
    let channels = rack.input_channels(device_index)?;
    let config = stream_config(channels, session.sample_rate().hz(), latency_secs);

    let mut feed = session.open_default_capture(channels);
    let shared = Arc::clone(session.shared());
    let data_shared = Arc::clone(&shared);

    let stream = device
        .build_input_stream_raw(
            &config,
            sample_format,
            move |data: &cpal::Data, _: &cpal::InputCallbackInfo| {
                if !data_shared.input_running.load(Ordering::Relaxed) {
                    return;
                }
                feed.write_interleaved(data.bytes());
            },
            move |err| {
                eprintln!("input stream error: {err}");
            },
            None,
        )
        .map_err(|_| DskError::InputStream)?;

    stream.play().map_err(|_| DskError::InputStream)?;
    shared.input_running.store(true, Ordering::Relaxed);
    Ok(stream)
}

pub(crate) fn start_output_stream(
    session: &Session,
    rack: &DeviceRack,
    device_index: i32,
    latency_secs: f32,
) -> Result<cpal::Stream> {
    let sample_format = session.format().stream_format().ok_or(DskError::IncompatibleDevice)?;
    let device = rack.output_device(device_index)?;
    let channels = rack.output_channels(device_index)?;
    let config = stream_config(channels, session.sample_rate().hz(), latency_secs);

    let mut renderer = session.renderer(channels);
    let shared = Arc::clone(session.shared());
    let data_shared = Arc::clone(&shared);
    let err_shared = Arc::clone(&shared);

    let stream = device
        .build_output_stream_raw(
            &config,
            sample_format,
            move |data: &mut cpal::Data, _: &cpal::OutputCallbackInfo| {
                let out = data.bytes_mut();
                if !data_shared.output_running.load(Ordering::Relaxed) {
                    out.fill(0);
                    return;
                }
                renderer.render(out, 0);
            },
            move |err| {
                err_shared.underruns.fetch_add(1, Ordering::Relaxed);
                eprintln!("output stream error: {err}");
            },
            None,
        )
        .map_err(|_| DskError::OutputStream)?;

    stream.play().map_err(|_| DskError::OutputStream)?;
    shared.output_running.store(true, Ordering::Relaxed);
    Ok(stream)
}
