//! Host device enumeration.
//!
//! A thin index-addressed view over the cpal host, so the rest of the
//! engine (and its outward API) can talk about devices by stable integer
//! index the way control surfaces expect.

use cpal::traits::{DeviceTrait, HostTrait};
use dsk_core::{DskError, Result};

use crate::format::SampleRate;

/// Basic information about an audio input or output device.
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    /// Human-readable device name.
    pub name: String,
    /// Index into the rack's device list.
    pub index: i32,
}

/// Connected host plus snapshot lists of its devices.
pub struct DeviceRack {
    host: cpal::Host,
    inputs: Vec<cpal::Device>,
    outputs: Vec<cpal::Device>,
}

impl DeviceRack {
    /// Connects to the default host and loads its device lists.
    pub fn connect() -> Result<Self> {
        let host = cpal::default_host();
        let mut rack = Self {
            host,
            inputs: Vec::new(),
            outputs: Vec::new(),
        };
        rack.reload()?;
        Ok(rack)
    }

    /// Re-scans the host's devices.
    pub fn reload(&mut self) -> Result<()> {
        self.inputs = self
            .host
            .input_devices()
            .map_err(|_| DskError::LoadingInputDevices)?
            .collect();
        self.outputs = self
            .host
            .output_devices()
            .map_err(|_| DskError::LoadingOutputDevices)?
            .collect();
        Ok(())
    }

    /// Identifier of the backend serving this rack.
    pub fn backend_name(&self) -> &'static str {
        self.host.id().name()
    }

    /// Number of input devices.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of output devices.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Index of the host's default input device.
    pub fn default_input_index(&self) -> Result<i32> {
        let default = self.host.default_input_device().ok_or(DskError::NoSuchDevice)?;
        let name = default.name().map_err(|_| DskError::LoadingInputDevices)?;
        index_by_name(&self.inputs, &name).ok_or(DskError::NoSuchDevice)
    }

    /// Index of the host's default output device.
    pub fn default_output_index(&self) -> Result<i32> {
        let default = self.host.default_output_device().ok_or(DskError::NoSuchDevice)?;
        let name = default.name().map_err(|_| DskError::LoadingOutputDevices)?;
        index_by_name(&self.outputs, &name).ok_or(DskError::NoSuchDevice)
    }

    /// Name of the input device at `index`.
    pub fn input_name(&self, index: i32) -> Result<String> {
        self.input_device(index)?
            .name()
            .map_err(|_| DskError::LoadingInputDevices)
    }

    /// Name of the output device at `index`.
    pub fn output_name(&self, index: i32) -> Result<String> {
        self.output_device(index)?
            .name()
            .map_err(|_| DskError::LoadingOutputDevices)
    }

    /// Channel count of the input device at `index`.
    pub fn input_channels(&self, index: i32) -> Result<usize> {
        let config = self
            .input_device(index)?
            .default_input_config()
            .map_err(|_| DskError::IncompatibleDevice)?;
        Ok(config.channels() as usize)
    }

    /// Channel count of the output device at `index`.
    pub fn output_channels(&self, index: i32) -> Result<usize> {
        let config = self
            .output_device(index)?
            .default_output_config()
            .map_err(|_| DskError::IncompatibleDevice)?;
        Ok(config.channels() as usize)
    }

    /// Fills a caller-allocated slice with input device records.
    ///
    /// Returns how many records were written (bounded by the slice).
    pub fn enumerate_inputs_into(&self, out: &mut [DeviceInfo]) -> usize {
        fill_info(&self.inputs, out)
    }

    /// Fills a caller-allocated slice with output device records.
    pub fn enumerate_outputs_into(&self, out: &mut [DeviceInfo]) -> usize {
        fill_info(&self.outputs, out)
    }

    /// Verifies the default input and output devices accept the session
    /// sample rate.
    pub fn validate_default_rates(&self, rate: SampleRate) -> Result<()> {
        let hz = cpal::SampleRate(rate.hz());

        let input = self.host.default_input_device().ok_or(DskError::NoSuchDevice)?;
        let ok = input
            .supported_input_configs()
            .map_err(|_| DskError::SettingSampleRate)?
            .any(|range| range.min_sample_rate() <= hz && hz <= range.max_sample_rate());
        if !ok {
            return Err(DskError::SettingSampleRate);
        }

        let output = self.host.default_output_device().ok_or(DskError::NoSuchDevice)?;
        let ok = output
            .supported_output_configs()
            .map_err(|_| DskError::SettingSampleRate)?
            .any(|range| range.min_sample_rate() <= hz && hz <= range.max_sample_rate());
        if !ok {
            return Err(DskError::SettingSampleRate);
        }

        Ok(())
    }

    pub(crate) fn input_device(&self, index: i32) -> Result<&cpal::Device> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.inputs.get(i))
            .ok_or(DskError::IndexOutOfBounds)
    }

    pub(crate) fn output_device(&self, index: i32) -> Result<&cpal::Device> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.outputs.get(i))
            .ok_or(DskError::IndexOutOfBounds)
    }
}

fn index_by_name(devices: &[cpal::Device], name: &str) -> Option<i32> {
    devices
        .iter()
        .position(|d| d.name().map(|n| n == name).unwrap_or(false))
        .map(|i| i as i32)
}

fn fill_info(devices: &[cpal::Device], out: &mut [DeviceInfo]) -> usize {
    let count = devices.len().min(out.len());
    for (i, device) in devices.iter().take(count).enumerate() {
        out[i] = DeviceInfo {
            name: device.name().unwrap_or_default(),
            index: i as i32,
        };
    }
    count
}
