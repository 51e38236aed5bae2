//! Engine-wide constants.

/// Frames of headroom in each per-channel capture ring.
pub const DEFAULT_BUFFER_FRAMES: usize = 64;

/// Size of every working audio buffer (track scratch, master bus) in bytes.
pub const MAX_BUFFER_SIZE_BYTES: usize = 8192;

/// Maximum number of effects per chain (track or master).
pub const MAX_NUM_EFFECTS: usize = 50;
