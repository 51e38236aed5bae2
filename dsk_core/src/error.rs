//! Error types for the dsk_audio workspace.
//!
//! This module provides a C-compatible error enum and a Result type alias
//! for use across all crates in the workspace. Discriminants are stable:
//! values below 16 mirror the host-backend numbering and pass through
//! unchanged, values from 16 upward belong to the engine.

use core::fmt;

/// Error codes for dsk_audio operations.
///
/// Uses `#[repr(i32)]` for a stable integer representation, enabling FFI
/// usage. Zero is reserved for success and therefore has no variant; use
/// [`DskError::code`] when an integer code is needed.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DskError {
    /// Memory allocation failed.
    NoMem = 1,
    /// The audio backend could not be initialized.
    InitAudioBackend = 2,
    /// The system ran out of resources for the backend.
    SystemResources = 3,
    /// A device could not be opened.
    OpeningDevice = 4,
    /// The requested device does not exist.
    NoSuchDevice = 5,
    /// An invalid parameter value was provided.
    Invalid = 6,
    /// No usable audio backend is available.
    BackendUnavailable = 7,
    /// A stream error occurred while audio was flowing.
    Streaming = 8,
    /// The device does not support the requested configuration.
    IncompatibleDevice = 9,
    /// The backend disconnected.
    BackendDisconnected = 12,
    /// The output stream underflowed.
    Underflow = 14,
    /// Device lists were queried before being initialized.
    DevicesNotInitialized = 16,
    /// The engine environment has not been initialized.
    EnvironmentNotInitialized = 17,
    /// An index was outside the valid range.
    IndexOutOfBounds = 18,
    /// Device lists have not been loaded.
    DevicesNotLoaded = 19,
    /// Input-side memory was not allocated.
    InputMemoryNotAllocated = 20,
    /// Output-side memory was not allocated.
    OutputMemoryNotAllocated = 21,
    /// No track exists with the given id.
    TrackNotFound = 22,
    /// A file could not be opened.
    OpeningFile = 23,
    /// A file could not be found.
    FileNotFound = 24,
    /// The input stream could not be established.
    InputStream = 26,
    /// The output stream could not be established.
    OutputStream = 27,
    /// Input devices could not be loaded.
    LoadingInputDevices = 28,
    /// Output devices could not be loaded.
    LoadingOutputDevices = 29,
    /// The requested sample rate could not be applied.
    SettingSampleRate = 30,
}

impl DskError {
    /// The stable integer code of this error.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for DskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DskError::NoMem => write!(f, "out of memory"),
            DskError::InitAudioBackend => write!(f, "failed to initialize audio backend"),
            DskError::SystemResources => write!(f, "out of system resources"),
            DskError::OpeningDevice => write!(f, "failed to open device"),
            DskError::NoSuchDevice => write!(f, "no such device"),
            DskError::Invalid => write!(f, "invalid parameter"),
            DskError::BackendUnavailable => write!(f, "audio backend unavailable"),
            DskError::Streaming => write!(f, "stream error"),
            DskError::IncompatibleDevice => write!(f, "device configuration not supported"),
            DskError::BackendDisconnected => write!(f, "audio backend disconnected"),
            DskError::Underflow => write!(f, "output underflow"),
            DskError::DevicesNotInitialized => write!(f, "devices not initialized"),
            DskError::EnvironmentNotInitialized => write!(f, "environment not initialized"),
            DskError::IndexOutOfBounds => write!(f, "index out of bounds"),
            DskError::DevicesNotLoaded => write!(f, "devices not loaded"),
            DskError::InputMemoryNotAllocated => write!(f, "input memory not allocated"),
            DskError::OutputMemoryNotAllocated => write!(f, "output memory not allocated"),
            DskError::TrackNotFound => write!(f, "track not found"),
            DskError::OpeningFile => write!(f, "failed to open file"),
            DskError::FileNotFound => write!(f, "file not found"),
            DskError::InputStream => write!(f, "input stream error"),
            DskError::OutputStream => write!(f, "output stream error"),
            DskError::LoadingInputDevices => write!(f, "failed to load input devices"),
            DskError::LoadingOutputDevices => write!(f, "failed to load output devices"),
            DskError::SettingSampleRate => write!(f, "failed to set sample rate"),
        }
    }
}

impl std::error::Error for DskError {}

/// Result type alias for dsk_audio operations.
pub type Result<T> = core::result::Result<T, DskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DskError::NoMem.code(), 1);
        assert_eq!(DskError::IncompatibleDevice.code(), 9);
        assert_eq!(DskError::DevicesNotInitialized.code(), 16);
        assert_eq!(DskError::TrackNotFound.code(), 22);
        // 25 is reserved in the historical numbering.
        assert_eq!(DskError::InputStream.code(), 26);
        assert_eq!(DskError::SettingSampleRate.code(), 30);
    }

    #[test]
    fn test_display_is_lowercase_and_short() {
        let msg = DskError::TrackNotFound.to_string();
        assert_eq!(msg, "track not found");
    }
}
