//! MSB-first bitfield access.
//!
//! RTCM 3 packs every data field back to back without byte alignment, most
//! significant bit first. The free functions here work on any byte slice
//! and treat an out of range access as a programming error (they panic).
//! Message decoders use [BitReader] instead, which walks a payload with a
//! cursor and reports truncated payloads as [DecodeError::InvalidLength].

use crate::error::DecodeError;

/// Reads `width` bits (at most 64) starting `pos` bits into `buf`, as an
/// unsigned integer.
///
/// # Panics
///
/// When `width > 64` or when `pos + width` exceeds the bit length of `buf`.
pub fn read_unsigned(buf: &[u8], pos: usize, width: usize) -> u64 {
    assert!(width <= 64, "bit field of {width} bits does not fit in u64");
    assert!(
        pos + width <= buf.len() * 8,
        "bit field {pos}+{width} runs past the {} bit payload",
        buf.len() * 8
    );
    let mut value = 0u64;
    for i in pos..pos + width {
        value = (value << 1) | u64::from((buf[i / 8] >> (7 - i % 8)) & 1);
    }
    value
}

/// Reads a two's-complement signed integer of `width` bits.
///
/// # Panics
///
/// Same preconditions as [read_unsigned].
pub fn read_signed(buf: &[u8], pos: usize, width: usize) -> i64 {
    sign_extend(read_unsigned(buf, pos, width), width)
}

/// Reads a signed field and multiplies it by `scale`, producing the
/// physical value.
///
/// # Panics
///
/// Same preconditions as [read_unsigned].
pub fn read_scaled(buf: &[u8], pos: usize, width: usize, scale: f64) -> f64 {
    read_signed(buf, pos, width) as f64 * scale
}

/// Reads a sign-magnitude integer (GLONASS convention): the first bit is the
/// sign, the remaining `width - 1` bits the magnitude.
///
/// # Panics
///
/// Same preconditions as [read_unsigned], and `width` must be at least 1.
pub fn read_sign_magnitude(buf: &[u8], pos: usize, width: usize) -> i64 {
    let negative = read_unsigned(buf, pos, 1) == 1;
    let magnitude = read_unsigned(buf, pos + 1, width - 1) as i64;
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

const fn sign_extend(value: u64, width: usize) -> i64 {
    if width == 0 {
        return 0;
    }
    let shift = 64 - width as u32;
    ((value << shift) as i64) >> shift
}

/// Cursor over a message payload (the frame bytes between the 3-byte
/// header and the CRC). Every read checks the remaining length first.
#[derive(Debug, Clone)]
pub(crate) struct BitReader<'a> {
    buf: &'a [u8],
    pos: usize,
    message_type: u16,
}

impl<'a> BitReader<'a> {
    /// Creates a reader positioned right after the 12-bit message number.
    pub(crate) fn new(payload: &'a [u8]) -> Result<Self, DecodeError> {
        if payload.len() * 8 < 12 {
            return Err(DecodeError::InvalidLength {
                message_type: 0,
                expect: 12,
                got: payload.len() * 8,
            });
        }
        let message_type = read_unsigned(payload, 0, 12) as u16;
        Ok(Self {
            buf: payload,
            pos: 12,
            message_type,
        })
    }

    pub(crate) fn message_type(&self) -> u16 {
        self.message_type
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() * 8 - self.pos
    }

    /// Fails unless at least `bits` more bits are available.
    pub(crate) fn ensure(&self, bits: usize) -> Result<(), DecodeError> {
        if bits > self.remaining() {
            return Err(DecodeError::InvalidLength {
                message_type: self.message_type,
                expect: self.pos + bits,
                got: self.buf.len() * 8,
            });
        }
        Ok(())
    }

    pub(crate) fn invalid(&self, field: &'static str) -> DecodeError {
        DecodeError::InvalidField {
            message_type: self.message_type,
            field,
        }
    }

    pub(crate) fn skip(&mut self, bits: usize) -> Result<(), DecodeError> {
        self.ensure(bits)?;
        self.pos += bits;
        Ok(())
    }

    pub(crate) fn unsigned(&mut self, width: usize) -> Result<u64, DecodeError> {
        self.ensure(width)?;
        let value = read_unsigned(self.buf, self.pos, width);
        self.pos += width;
        Ok(value)
    }

    pub(crate) fn u8(&mut self, width: usize) -> Result<u8, DecodeError> {
        debug_assert!(width <= 8);
        Ok(self.unsigned(width)? as u8)
    }

    pub(crate) fn u16(&mut self, width: usize) -> Result<u16, DecodeError> {
        debug_assert!(width <= 16);
        Ok(self.unsigned(width)? as u16)
    }

    pub(crate) fn u32(&mut self, width: usize) -> Result<u32, DecodeError> {
        debug_assert!(width <= 32);
        Ok(self.unsigned(width)? as u32)
    }

    pub(crate) fn flag(&mut self) -> Result<bool, DecodeError> {
        Ok(self.unsigned(1)? == 1)
    }

    pub(crate) fn signed(&mut self, width: usize) -> Result<i64, DecodeError> {
        self.ensure(width)?;
        let value = read_signed(self.buf, self.pos, width);
        self.pos += width;
        Ok(value)
    }

    pub(crate) fn sign_magnitude(&mut self, width: usize) -> Result<i64, DecodeError> {
        self.ensure(width)?;
        let value = read_sign_magnitude(self.buf, self.pos, width);
        self.pos += width;
        Ok(value)
    }

    /// Signed field times `scale`
    pub(crate) fn scaled(&mut self, width: usize, scale: f64) -> Result<f64, DecodeError> {
        Ok(self.signed(width)? as f64 * scale)
    }

    /// Unsigned field times `scale`
    pub(crate) fn scaled_unsigned(&mut self, width: usize, scale: f64) -> Result<f64, DecodeError> {
        Ok(self.unsigned(width)? as f64 * scale)
    }

    /// Sign-magnitude field times `scale`
    pub(crate) fn scaled_sign_magnitude(
        &mut self,
        width: usize,
        scale: f64,
    ) -> Result<f64, DecodeError> {
        Ok(self.sign_magnitude(width)? as f64 * scale)
    }

    /// Reads `count` whole bytes, which need not be byte aligned.
    pub(crate) fn bytes(&mut self, count: usize) -> Result<Vec<u8>, DecodeError> {
        self.ensure(count * 8)?;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.u8(8)?);
        }
        Ok(out)
    }

    /// Reads an 8-bit length followed by that many characters.
    pub(crate) fn counted_string(&mut self) -> Result<String, DecodeError> {
        let len = usize::from(self.u8(8)?);
        let raw = self.bytes(len)?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}
