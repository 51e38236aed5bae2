//! Sample formats and rates.
//!
//! A [`FormatInfo`] describes how one sample of a given [`SampleKind`]
//! lives in a streaming buffer: its bit depth, its footprint on the wire,
//! its packed size, and its clip range. 24-bit audio occupies four bytes
//! on the wire with a zero pad byte at the high end, but packs to three.

/// Logical sample formats. All integer formats are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    U8,
    S8,
    U16,
    S16,
    U24,
    S24,
    U32,
    S32,
    F32,
    F64,
}

/// Session sample rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleRate {
    Sr44100,
    Sr48000,
}

impl SampleRate {
    /// The rate in Hertz.
    #[inline]
    pub const fn hz(self) -> u32 {
        match self {
            SampleRate::Sr44100 => 44100,
            SampleRate::Sr48000 => 48000,
        }
    }
}

/// Immutable description of a sample format's wire layout and clip range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatInfo {
    /// The logical format this record describes.
    pub kind: SampleKind,
    /// Significant bits per sample.
    pub bit_depth: u8,
    /// Bytes one sample occupies in a streaming buffer (24-bit: 4).
    pub bytes_in_wire: usize,
    /// Bytes one sample occupies when packed (24-bit: 3).
    pub bytes_packed: usize,
    /// Whether the format is signed.
    pub signed: bool,
    /// Largest representable value (1 for float formats).
    pub max: i64,
    /// Smallest representable value (0 for unsigned, -1 for float).
    pub min: i64,
}

impl FormatInfo {
    /// Looks up the descriptor for a format kind.
    pub const fn of(kind: SampleKind) -> FormatInfo {
        match kind {
            SampleKind::U8 => FormatInfo {
                kind,
                bit_depth: 8,
                bytes_in_wire: 1,
                bytes_packed: 1,
                signed: false,
                max: u8::MAX as i64,
                min: 0,
            },
            SampleKind::S8 => FormatInfo {
                kind,
                bit_depth: 8,
                bytes_in_wire: 1,
                bytes_packed: 1,
                signed: true,
                max: i8::MAX as i64,
                min: i8::MIN as i64,
            },
            SampleKind::U16 => FormatInfo {
                kind,
                bit_depth: 16,
                bytes_in_wire: 2,
                bytes_packed: 2,
                signed: false,
                max: u16::MAX as i64,
                min: 0,
            },
            SampleKind::S16 => FormatInfo {
                kind,
                bit_depth: 16,
                bytes_in_wire: 2,
                bytes_packed: 2,
                signed: true,
                max: i16::MAX as i64,
                min: i16::MIN as i64,
            },
            SampleKind::U24 => FormatInfo {
                kind,
                bit_depth: 24,
                bytes_in_wire: 4,
                bytes_packed: 3,
                signed: false,
                max: 16_777_215,
                min: 0,
            },
            SampleKind::S24 => FormatInfo {
                kind,
                bit_depth: 24,
                bytes_in_wire: 4,
                bytes_packed: 3,
                signed: true,
                max: 8_388_607,
                min: -8_388_608,
            },
            SampleKind::U32 => FormatInfo {
                kind,
                bit_depth: 32,
                bytes_in_wire: 4,
                bytes_packed: 4,
                signed: false,
                max: u32::MAX as i64,
                min: 0,
            },
            SampleKind::S32 => FormatInfo {
                kind,
                bit_depth: 32,
                bytes_in_wire: 4,
                bytes_packed: 4,
                signed: true,
                max: i32::MAX as i64,
                min: i32::MIN as i64,
            },
            SampleKind::F32 => FormatInfo {
                kind,
                bit_depth: 32,
                bytes_in_wire: 4,
                bytes_packed: 4,
                signed: true,
                max: 1,
                min: -1,
            },
            SampleKind::F64 => FormatInfo {
                kind,
                bit_depth: 64,
                bytes_in_wire: 8,
                bytes_packed: 8,
                signed: true,
                max: 1,
                min: -1,
            },
        }
    }

    /// Returns `true` for the floating-point formats.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self.kind, SampleKind::F32 | SampleKind::F64)
    }

    /// The backend wire format, if the backend can stream this kind.
    ///
    /// 24-bit audio has no cpal equivalent; such sessions mix offline but
    /// cannot open live streams.
    pub fn stream_format(&self) -> Option<cpal::SampleFormat> {
        match self.kind {
            SampleKind::U8 => Some(cpal::SampleFormat::U8),
            SampleKind::S8 => Some(cpal::SampleFormat::I8),
            SampleKind::U16 => Some(cpal::SampleFormat::U16),
            SampleKind::S16 => Some(cpal::SampleFormat::I16),
            SampleKind::U24 | SampleKind::S24 => None,
            SampleKind::U32 => Some(cpal::SampleFormat::U32),
            SampleKind::S32 => Some(cpal::SampleFormat::I32),
            SampleKind::F32 => Some(cpal::SampleFormat::F32),
            SampleKind::F64 => Some(cpal::SampleFormat::F64),
        }
    }
}
