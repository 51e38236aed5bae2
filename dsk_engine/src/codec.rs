//! PCM sample codec.
//!
//! The only place that knows about endianness, padding and clipping.
//! Everything above it (tracks, mix bus, meters) handles samples as whole
//! byte buffers plus a [`FormatInfo`], which keeps the mix pipeline
//! format-agnostic.
//!
//! Integer samples decode to a 64-bit working value, are combined in
//! double precision, then hard-saturated back into the format's clip
//! range. Normalization divides non-negative (and all unsigned) values by
//! `max` and negative signed values by `|min|`, so full scale lands
//! exactly on ±1.0.

use crate::format::{FormatInfo, SampleKind};

#[inline]
fn decode_int(bytes: &[u8], fmt: &FormatInfo) -> i64 {
    let mut raw: u64 = 0;
    for (j, &b) in bytes.iter().enumerate().take(fmt.bytes_packed) {
        raw |= (b as u64) << (j * 8);
    }
    if fmt.signed {
        let shift = 64 - fmt.bit_depth as u32;
        ((raw << shift) as i64) >> shift
    } else {
        raw as i64
    }
}

#[inline]
fn encode_int(value: i64, fmt: &FormatInfo, bytes: &mut [u8]) {
    for j in 0..fmt.bytes_packed {
        bytes[j] = (value >> (j * 8)) as u8;
    }
    // 24-bit wire slots carry a zero pad byte at the high end
    for j in fmt.bytes_packed..fmt.bytes_in_wire {
        bytes[j] = 0;
    }
}

#[inline]
fn read_f32(bytes: &[u8]) -> f32 {
    f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Decodes one sample into a normalized float in `[-1.0, +1.0]`.
///
/// `bytes` must hold at least `fmt.bytes_in_wire` bytes. Formats the
/// codec cannot stream (`F64`) decode to 0.0 rather than propagating
/// undefined data.
pub fn decode_sample(bytes: &[u8], fmt: &FormatInfo) -> f32 {
    match fmt.kind {
        SampleKind::F32 => read_f32(bytes),
        SampleKind::F64 => 0.0,
        _ => {
            let value = decode_int(bytes, fmt) as f64;
            if value >= 0.0 || !fmt.signed {
                (value / fmt.max as f64) as f32
            } else {
                (value / -(fmt.min as f64)) as f32
            }
        }
    }
}

/// Encodes a normalized float into one wire slot, saturating to the
/// format's clip range.
pub fn encode_sample(value: f32, fmt: &FormatInfo, out: &mut [u8]) {
    match fmt.kind {
        SampleKind::F32 => out[..4].copy_from_slice(&value.to_le_bytes()),
        SampleKind::F64 => out[..fmt.bytes_in_wire].fill(0),
        _ => {
            let scaled = if value >= 0.0 {
                value as f64 * fmt.max as f64
            } else {
                value as f64 * -(fmt.min as f64)
            };
            let quantized = libm::round(scaled) as i64;
            encode_int(quantized.clamp(fmt.min, fmt.max), fmt, out);
        }
    }
}

/// For each of `num_samples` slots: decode `src` and `dst`, compute
/// `(src + dst) · gain`, saturate, and write the result back into `dst`.
///
/// Saturation is hard: `[min, max]` for signed formats, `[0, max]` for
/// unsigned, `[-1, +1]` for float. 24-bit slots get their pad byte
/// zeroed. Pure; no hidden state.
pub fn add_and_scale(src: &[u8], dst: &mut [u8], fmt: &FormatInfo, gain: f32, num_samples: usize) {
    let biw = fmt.bytes_in_wire;
    debug_assert!(src.len() >= num_samples * biw);
    debug_assert!(dst.len() >= num_samples * biw);

    match fmt.kind {
        SampleKind::F32 => {
            for i in 0..num_samples {
                let offset = i * biw;
                let s = read_f32(&src[offset..]);
                let d = read_f32(&dst[offset..]);
                let result = ((s + d) * gain).clamp(-1.0, 1.0);
                dst[offset..offset + 4].copy_from_slice(&result.to_le_bytes());
            }
        }
        SampleKind::F64 => {}
        _ => {
            for i in 0..num_samples {
                let offset = i * biw;
                let s = decode_int(&src[offset..], fmt);
                let d = decode_int(&dst[offset..], fmt);
                // Truncation toward zero, like the integer conversion it
                // replaces
                let result = ((s + d) as f64 * gain as f64) as i64;
                encode_int(result.clamp(fmt.min, fmt.max), fmt, &mut dst[offset..]);
            }
        }
    }
}

/// Scales `num_samples` slots in place by `gain`, saturating like
/// [`add_and_scale`] but without the add.
pub fn scale(buf: &mut [u8], fmt: &FormatInfo, gain: f32, num_samples: usize) {
    let biw = fmt.bytes_in_wire;
    debug_assert!(buf.len() >= num_samples * biw);

    match fmt.kind {
        SampleKind::F32 => {
            for i in 0..num_samples {
                let offset = i * biw;
                let s = read_f32(&buf[offset..]);
                let result = (s * gain).clamp(-1.0, 1.0);
                buf[offset..offset + 4].copy_from_slice(&result.to_le_bytes());
            }
        }
        SampleKind::F64 => {}
        _ => {
            for i in 0..num_samples {
                let offset = i * biw;
                let s = decode_int(&buf[offset..], fmt);
                let result = (s as f64 * gain as f64) as i64;
                encode_int(result.clamp(fmt.min, fmt.max), fmt, &mut buf[offset..]);
            }
        }
    }
}

/// Root-mean-square of a buffer of normalized samples, in `[0, 1]`.
///
/// Decodes every whole sample in `buf`; trailing bytes that do not fill a
/// slot are ignored. An empty buffer reads as silence.
pub fn rms(buf: &[u8], fmt: &FormatInfo) -> f32 {
    let biw = fmt.bytes_in_wire;
    let samples = buf.len() / biw;
    if samples == 0 {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for i in 0..samples {
        let s = decode_sample(&buf[i * biw..], fmt) as f64;
        acc += s * s;
    }
    libm::sqrt(acc / samples as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    const INT_KINDS: [SampleKind; 8] = [
        SampleKind::U8,
        SampleKind::S8,
        SampleKind::U16,
        SampleKind::S16,
        SampleKind::U24,
        SampleKind::S24,
        SampleKind::U32,
        SampleKind::S32,
    ];

    fn wire_of(raw: i64, fmt: &FormatInfo) -> Vec<u8> {
        let mut bytes = vec![0u8; fmt.bytes_in_wire];
        encode_int(raw, fmt, &mut bytes);
        bytes
    }

    fn raw_of(bytes: &[u8], fmt: &FormatInfo) -> i64 {
        decode_int(bytes, fmt)
    }

    #[test]
    fn test_full_scale_decodes_to_unity() {
        for kind in INT_KINDS {
            let fmt = FormatInfo::of(kind);
            let max_wire = wire_of(fmt.max, &fmt);
            assert_eq!(decode_sample(&max_wire, &fmt), 1.0, "{kind:?} max");
            if fmt.signed {
                let min_wire = wire_of(fmt.min, &fmt);
                assert_eq!(decode_sample(&min_wire, &fmt), -1.0, "{kind:?} min");
            }
        }
    }

    #[test]
    fn test_roundtrip_within_one_lsb_up_to_24_bit() {
        for kind in [
            SampleKind::U8,
            SampleKind::S8,
            SampleKind::U16,
            SampleKind::S16,
            SampleKind::U24,
            SampleKind::S24,
        ] {
            let fmt = FormatInfo::of(kind);
            let probes = [
                fmt.min,
                fmt.min / 2,
                fmt.min / 3,
                -1,
                0,
                1,
                fmt.max / 3,
                fmt.max / 2,
                fmt.max,
            ];
            for raw in probes {
                let raw = raw.clamp(fmt.min, fmt.max);
                let wire = wire_of(raw, &fmt);
                let sample = decode_sample(&wire, &fmt);
                let mut rewire = vec![0u8; fmt.bytes_in_wire];
                encode_sample(sample, &fmt, &mut rewire);
                let back = raw_of(&rewire, &fmt);
                assert!((back - raw).abs() <= 1, "{kind:?}: {raw} -> {sample} -> {back}");
            }
        }
    }

    #[test]
    fn test_roundtrip_exact_for_32_bit_representables() {
        // 32-bit values survive the f32 normalization only when they fit
        // the mantissa; clip extremes and mantissa-sized values must be
        // exact.
        for kind in [SampleKind::U32, SampleKind::S32] {
            let fmt = FormatInfo::of(kind);
            let probes = [fmt.min, fmt.min / 2, 0, 1 << 20, fmt.max / 2 + 1, fmt.max];
            for raw in probes {
                let raw = raw.clamp(fmt.min, fmt.max);
                let wire = wire_of(raw, &fmt);
                let sample = decode_sample(&wire, &fmt);
                let mut rewire = vec![0u8; fmt.bytes_in_wire];
                encode_sample(sample, &fmt, &mut rewire);
                let back = raw_of(&rewire, &fmt);
                let step = (fmt.max as f64 / (1u64 << 24) as f64).ceil() as i64;
                assert!((back - raw).abs() <= step, "{kind:?}: {raw} -> {back}");
            }
        }
    }

    #[test]
    fn test_add_and_scale_identity_onto_silence() {
        for kind in [SampleKind::S16, SampleKind::S24, SampleKind::U8] {
            let fmt = FormatInfo::of(kind);
            let values = [fmt.min, fmt.min / 2, 0, fmt.max / 2, fmt.max];
            let mut src = Vec::new();
            for v in values {
                src.extend_from_slice(&wire_of(v.clamp(fmt.min, fmt.max), &fmt));
            }
            let mut dst = vec![0u8; src.len()];
            add_and_scale(&src, &mut dst, &fmt, 1.0, values.len());
            assert_eq!(dst, src, "{kind:?}");
        }
    }

    #[test]
    fn test_add_saturates_hard() {
        let fmt = FormatInfo::of(SampleKind::S16);
        let src = wire_of(30000, &fmt);
        let mut dst = wire_of(30000, &fmt);
        add_and_scale(&src, &mut dst, &fmt, 1.0, 1);
        assert_eq!(raw_of(&dst, &fmt), fmt.max);

        let src = wire_of(-30000, &fmt);
        let mut dst = wire_of(-30000, &fmt);
        add_and_scale(&src, &mut dst, &fmt, 1.0, 1);
        assert_eq!(raw_of(&dst, &fmt), fmt.min);
    }

    #[test]
    fn test_unsigned_saturates_at_zero_and_max() {
        let fmt = FormatInfo::of(SampleKind::U8);
        let src = wire_of(200, &fmt);
        let mut dst = wire_of(200, &fmt);
        add_and_scale(&src, &mut dst, &fmt, 1.0, 1);
        assert_eq!(raw_of(&dst, &fmt), 255);

        // Unsigned values cannot scale below zero
        let mut buf = wire_of(10, &fmt);
        scale(&mut buf, &fmt, -4.0, 1);
        assert_eq!(raw_of(&buf, &fmt), 0);
    }

    #[test]
    fn test_result_never_leaves_clip_range() {
        for kind in INT_KINDS {
            let fmt = FormatInfo::of(kind);
            for gain in [0.0f32, 0.5, 1.0, 4.0, 100.0] {
                for v in [fmt.min, fmt.min / 2, 0, fmt.max / 2, fmt.max] {
                    let src = wire_of(v.clamp(fmt.min, fmt.max), &fmt);
                    let mut dst = src.clone();
                    add_and_scale(&src, &mut dst, &fmt, gain, 1);
                    let out = raw_of(&dst, &fmt);
                    assert!(out >= fmt.min && out <= fmt.max, "{kind:?} gain {gain} value {v} -> {out}");
                }
            }
        }
    }

    #[test]
    fn test_24_bit_pad_byte_stays_zero() {
        let fmt = FormatInfo::of(SampleKind::S24);
        let src = wire_of(-1_000_000, &fmt);
        let mut dst = wire_of(2_000_000, &fmt);
        add_and_scale(&src, &mut dst, &fmt, 1.5, 1);
        assert_eq!(dst[3], 0);
        assert_eq!(raw_of(&dst, &fmt), 1_500_000);
    }

    #[test]
    fn test_scale_halves() {
        let fmt = FormatInfo::of(SampleKind::S16);
        let mut buf = wire_of(10000, &fmt);
        buf.extend_from_slice(&wire_of(-10000, &fmt));
        scale(&mut buf, &fmt, 0.5, 2);
        assert_eq!(raw_of(&buf[..2], &fmt), 5000);
        assert_eq!(raw_of(&buf[2..], &fmt), -5000);
    }

    #[test]
    fn test_float_add_clamps_to_unit_range() {
        let fmt = FormatInfo::of(SampleKind::F32);
        let src: Vec<u8> = 0.8f32.to_le_bytes().to_vec();
        let mut dst: Vec<u8> = 0.7f32.to_le_bytes().to_vec();
        add_and_scale(&src, &mut dst, &fmt, 1.0, 1);
        assert_eq!(read_f32(&dst), 1.0);

        let src: Vec<u8> = (-0.8f32).to_le_bytes().to_vec();
        let mut dst: Vec<u8> = (-0.7f32).to_le_bytes().to_vec();
        add_and_scale(&src, &mut dst, &fmt, 1.0, 1);
        assert_eq!(read_f32(&dst), -1.0);
    }

    #[test]
    fn test_rms_of_silence_is_zero() {
        let fmt = FormatInfo::of(SampleKind::S16);
        let buf = vec![0u8; 64 * 2];
        assert_eq!(rms(&buf, &fmt), 0.0);
        assert_eq!(rms(&[], &fmt), 0.0);
    }

    #[test]
    fn test_rms_of_full_scale_square_wave_is_unity() {
        let fmt = FormatInfo::of(SampleKind::S16);
        let mut buf = Vec::new();
        for i in 0..64 {
            let v = if i % 2 == 0 { fmt.max } else { fmt.min };
            buf.extend_from_slice(&wire_of(v, &fmt));
        }
        let level = rms(&buf, &fmt);
        assert!((level - 1.0).abs() < 1.0 / 32768.0, "rms = {level}");
    }

    #[test]
    fn test_rms_of_half_scale_constant() {
        let fmt = FormatInfo::of(SampleKind::S16);
        let half = wire_of(fmt.max / 2, &fmt);
        let mut buf = Vec::new();
        for _ in 0..32 {
            buf.extend_from_slice(&half);
        }
        let level = rms(&buf, &fmt);
        assert!((level - 0.5).abs() < 1e-3, "rms = {level}");
    }

    #[test]
    fn test_f64_decodes_to_silence() {
        let fmt = FormatInfo::of(SampleKind::F64);
        let bytes = 0.5f64.to_le_bytes();
        assert_eq!(decode_sample(&bytes, &fmt), 0.0);
    }
}
