//! ITU-T G.711 mu-law companding.
//!
//! Stateless and pure: segment/mantissa encoding with the standard bias,
//! output bits complemented per the law. 16-bit linear PCM in, one byte
//! per sample out.

const BIAS: i32 = 0x84;
const CLIP: i32 = 32635;

/// Encode one linear PCM sample to a mu-law byte.
///
/// Input is clipped to the representable range before the segment
/// search, so `i16::MIN` never overflows the mantissa field.
/// `encode(0)` is `0xFF` (the bias maps zero into segment 0).
pub fn encode(sample: i16) -> u8 {
    let mut s = sample as i32;
    let sign: u8 = if s < 0 {
        s = -s;
        0x80
    } else {
        0
    };
    if s > CLIP {
        s = CLIP;
    }
    s += BIAS;

    // Segment: position of the highest set bit above the mantissa
    let mut exponent = 7u8;
    let mut mask = 0x4000;
    while exponent > 0 && (s & mask) == 0 {
        exponent -= 1;
        mask >>= 1;
    }

    let mantissa = ((s >> (exponent + 3)) & 0x0F) as u8;
    !(sign | (exponent << 4) | mantissa)
}

/// Decode one mu-law byte back to a linear PCM sample.
pub fn decode(byte: u8) -> i16 {
    let b = !byte;
    let sign = b & 0x80;
    let exponent = (b >> 4) & 0x07;
    let mantissa = (b & 0x0F) as i32;

    let magnitude = (((mantissa << 3) + BIAS) << exponent) - BIAS;
    if sign != 0 {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}

/// Encode a buffer of samples element-wise, one byte per sample.
pub fn encode_buffer(samples: &[i16]) -> Vec<u8> {
    samples.iter().map(|&s| encode(s)).collect()
}

/// Decode a buffer of mu-law bytes element-wise.
pub fn decode_buffer(bytes: &[u8]) -> Vec<i16> {
    bytes.iter().map(|&b| decode(b)).collect()
}
